//! Modelo de Driver
//!
//! La presencia de un conductor dentro de un evento. Mapea exactamente
//! a la tabla drivers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del conductor - mapea al ENUM driver_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "driver_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Offline,
    Available,
    Assigned,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Offline => "offline",
            DriverStatus::Available => "available",
            DriverStatus::Assigned => "assigned",
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub event_id: Uuid,
    pub driver_name: String,
    pub is_online: bool,
    pub status: DriverStatus,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub max_capacity: i32,
    pub current_passenger_load: i32,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    /// Capacidad todavía libre en el vehículo
    pub fn available_capacity(&self) -> i32 {
        self.max_capacity - self.current_passenger_load
    }

    /// Posición conocida del conductor, si ya reportó ubicación
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.current_lat, self.current_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}
