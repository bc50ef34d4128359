//! Modelos del motor de seguridad
//!
//! Penalidades por no-show (pseudónimas, por evento), consentimientos y
//! registros de emergencia.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tracking de no-shows por (evento, rider_hash).
/// Al alcanzar el umbral se setea cooldown_until y el contador vuelve a 0.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RiderPenalty {
    pub id: Uuid,
    pub event_id: Uuid,
    pub rider_hash: String,
    pub no_show_count: i32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Consentimiento del rider - condición previa a crear rides
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RiderConsent {
    pub id: Uuid,
    pub event_id: Uuid,
    pub rider_hash: String,
    pub consented_at: DateTime<Utc>,
}

/// Registro de emergencia - independiente del estado del dispatch
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmergencyEvent {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ride_request_id: Option<Uuid>,
    pub rider_hash: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
