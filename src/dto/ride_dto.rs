//! DTOs de ride requests

use crate::models::{BatchStatus, RideRequest, RideStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request para crear un ride. El hash pseudónimo se deriva server-side
/// de evento + nombre + dirección de pickup.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRideRequest {
    pub event_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub rider_name: String,

    #[validate(length(min = 1, max = 300))]
    pub pickup_address: String,

    pub pickup_lat: f64,
    pub pickup_lng: f64,

    #[validate(range(min = 1, max = 4))]
    pub passenger_count: i32,
}

/// Response de ride para la API
#[derive(Debug, Serialize)]
pub struct RideResponse {
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
    pub created_at: DateTime<Utc>,
}

impl From<RideRequest> for RideResponse {
    fn from(ride: RideRequest) -> Self {
        Self {
            id: ride.id,
            event_id: ride.event_id,
            rider_name: ride.rider_name,
            pickup_address: ride.pickup_address,
            pickup_lat: ride.pickup_lat,
            pickup_lng: ride.pickup_lng,
            passenger_count: ride.passenger_count,
            status: ride.status,
            assigned_driver_id: ride.assigned_driver_id,
            batch_id: ride.batch_id,
            batch_sequence: ride.batch_sequence,
            estimated_wait_minutes: ride.estimated_wait_minutes,
            driver_eta_minutes: ride.driver_eta_minutes,
            arrival_timestamp: ride.arrival_timestamp,
            arrival_deadline: ride.arrival_deadline,
            completion_timestamp: ride.completion_timestamp,
            rider_confirmed: ride.rider_confirmed,
            created_at: ride.created_at,
        }
    }
}

/// Posición en la cola de espera
#[derive(Debug, Serialize)]
pub struct QueuePositionResponse {
    pub ride_id: Uuid,
    pub position: i64,
    pub estimated_wait_minutes: i32,
}

/// Posición del rider dentro de su batch
#[derive(Debug, Serialize)]
pub struct BatchPositionResponse {
    pub batch_id: Uuid,
    pub batch_status: BatchStatus,
    pub pickup_order_index: i32,
    pub total_stops: i64,
    pub picked_up_count: i64,
    pub estimated_arrival_time: Option<DateTime<Utc>>,
    pub picked_up: bool,
}
