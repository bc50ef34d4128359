//! Modelos de RideBatch y RideBatchItem
//!
//! Un batch agrupa varios ride requests en un solo viaje multi-parada
//! asignado a un conductor. Los items llevan el orden de pickup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del batch - mapea al ENUM batch_status
///
/// `in_progress` denota la fase de drop-off: todos los pickups hechos,
/// el viaje va en camino a los destinos.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "batch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RideBatch principal - mapea exactamente a la tabla ride_batches
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RideBatch {
    pub id: Uuid,
    pub event_id: Uuid,
    pub driver_id: Uuid,
    pub status: BatchStatus,
    pub total_passengers: i32,
    pub created_at: DateTime<Utc>,
}

/// Posición de un ride dentro de un batch - tabla ride_batch_items.
/// Los pickup_order_index de un batch forman la secuencia contigua 0..n-1.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RideBatchItem {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub ride_request_id: Uuid,
    pub pickup_order_index: i32,
    pub estimated_arrival_time: Option<DateTime<Utc>>,
    pub picked_up: bool,
    pub picked_up_at: Option<DateTime<Utc>>,
}
