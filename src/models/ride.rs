//! Modelo de RideRequest
//!
//! Este módulo contiene el struct RideRequest, el enum de estados del
//! ciclo de vida y la tabla de transiciones permitidas. Mapea exactamente
//! al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del ride - mapea al ENUM ride_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "ride_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Waiting,
    Assigned,
    Arrived,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Waiting => "waiting",
            RideStatus::Assigned => "assigned",
            RideStatus::Arrived => "arrived",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
            RideStatus::NoShow => "no_show",
        }
    }

    /// Estados terminales: inmutables una vez alcanzados
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RideStatus::Completed | RideStatus::Cancelled | RideStatus::NoShow
        )
    }

    /// Tabla de transiciones del ciclo de vida.
    ///
    /// waiting → assigned → arrived → in_progress → completed, con
    /// cancelled y no_show como salidas laterales.
    pub fn can_transition_to(&self, target: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, target),
            (Waiting, Assigned)
                | (Waiting, Cancelled)
                | (Assigned, Arrived)
                | (Assigned, Cancelled)
                | (Assigned, NoShow)
                | (Arrived, InProgress)
                | (Arrived, Cancelled)
                | (Arrived, NoShow)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn all() -> [RideStatus; 7] {
        use RideStatus::*;
        [Waiting, Assigned, Arrived, InProgress, Completed, Cancelled, NoShow]
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RideRequest principal - mapea exactamente a la tabla ride_requests
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RideRequest {
    pub id: Uuid,
    pub event_id: Uuid,
    pub rider_name: String,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub passenger_count: i32,
    pub status: RideStatus,
    pub assigned_driver_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub batch_sequence: Option<i32>,
    pub estimated_wait_minutes: Option<i32>,
    pub driver_eta_minutes: Option<i32>,
    pub arrival_timestamp: Option<DateTime<Utc>>,
    pub arrival_deadline: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub rider_confirmed: bool,
    pub rider_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pares permitidos exactos de la tabla de transiciones
    fn allowed_pairs() -> Vec<(RideStatus, RideStatus)> {
        use RideStatus::*;
        vec![
            (Waiting, Assigned),
            (Waiting, Cancelled),
            (Assigned, Arrived),
            (Assigned, Cancelled),
            (Assigned, NoShow),
            (Arrived, InProgress),
            (Arrived, Cancelled),
            (Arrived, NoShow),
            (InProgress, Completed),
            (InProgress, Cancelled),
        ]
    }

    #[test]
    fn test_transition_table_completeness() {
        // Todo par (from, to) que no esté en la tabla debe rechazarse
        let allowed = allowed_pairs();
        for from in RideStatus::all() {
            for to in RideStatus::all() {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {} should be {}",
                    from,
                    to,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [RideStatus::Completed, RideStatus::Cancelled, RideStatus::NoShow] {
            assert!(terminal.is_terminal());
            for to in RideStatus::all() {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in RideStatus::all() {
            assert!(!status.can_transition_to(status));
        }
    }
}
