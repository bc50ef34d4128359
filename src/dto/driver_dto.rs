//! DTOs de conductores

use crate::models::{Driver, DriverStatus, RideBatch, RideBatchItem, RideRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    pub event_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub driver_name: String,

    #[validate(range(min = 1, max = 8))]
    pub max_capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DriverLocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct DriverOnlineRequest {
    pub online: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListDriversQuery {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DriverResponse {
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

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            event_id: driver.event_id,
            driver_name: driver.driver_name,
            is_online: driver.is_online,
            status: driver.status,
            current_lat: driver.current_lat,
            current_lng: driver.current_lng,
            max_capacity: driver.max_capacity,
            current_passenger_load: driver.current_passenger_load,
            created_at: driver.created_at,
        }
    }
}

/// Una parada del batch activo con los datos del ride
#[derive(Debug, Serialize)]
pub struct BatchStopDetail {
    pub item_id: Uuid,
    pub ride_request_id: Uuid,
    pub pickup_order_index: i32,
    pub rider_name: String,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub passenger_count: i32,
    pub estimated_arrival_time: Option<DateTime<Utc>>,
    pub picked_up: bool,
    pub picked_up_at: Option<DateTime<Utc>>,
}

impl BatchStopDetail {
    pub fn from_parts(item: &RideBatchItem, ride: &RideRequest) -> Self {
        Self {
            item_id: item.id,
            ride_request_id: item.ride_request_id,
            pickup_order_index: item.pickup_order_index,
            rider_name: ride.rider_name.clone(),
            pickup_address: ride.pickup_address.clone(),
            pickup_lat: ride.pickup_lat,
            pickup_lng: ride.pickup_lng,
            passenger_count: ride.passenger_count,
            estimated_arrival_time: item.estimated_arrival_time,
            picked_up: item.picked_up,
            picked_up_at: item.picked_up_at,
        }
    }
}

/// Batch activo del conductor con su ruta ordenada
#[derive(Debug, Serialize)]
pub struct ActiveBatchResponse {
    pub batch: RideBatch,
    pub stops: Vec<BatchStopDetail>,
}
