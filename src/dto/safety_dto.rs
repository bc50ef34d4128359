//! DTOs del motor de seguridad

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct NoShowRequest {
    pub ride_id: Uuid,
}

/// Query de cooldown: el hash se deriva server-side de nombre + origen
#[derive(Debug, Deserialize, Validate)]
pub struct CooldownQuery {
    pub event_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub rider_name: String,

    #[validate(length(min = 1, max = 300))]
    pub origin: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsentRequest {
    pub event_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub rider_name: String,

    #[validate(length(min = 1, max = 300))]
    pub origin: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmergencyRequest {
    pub event_id: Uuid,
    pub ride_request_id: Option<Uuid>,

    #[validate(length(max = 100))]
    pub rider_name: Option<String>,

    #[validate(length(max = 300))]
    pub origin: Option<String>,

    #[validate(length(max = 2000))]
    pub details: Option<String>,
}
