//! DTOs de los triggers de dispatch

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DispatchAllResponse {
    pub assigned_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct MarkPickupRequest {
    pub batch_item_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompleteBatchRequest {
    pub batch_id: Uuid,
}
