//! Agregador de analytics
//!
//! Estadísticas derivadas de solo lectura sobre el historial de rides de
//! un evento. Valida de paso los invariantes de timestamps de la máquina
//! de estados: espera = llegada - creación, duración = fin - llegada.

use crate::models::{RideRequest, RideStatus};
use crate::repositories::RideRepository;
use crate::utils::errors::AppError;
use chrono::Timelike;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Métricas agregadas de un evento. Todo default a 0 con sets vacíos;
/// nunca hay división por cero.
#[derive(Debug, Clone, Serialize)]
pub struct EventAnalytics {
    pub total_rides: usize,
    pub waiting_rides: usize,
    pub completed_rides: usize,
    pub cancelled_rides: usize,
    pub no_show_rides: usize,
    /// Promedio de espera (llegada - creación) sobre completados con
    /// ambos timestamps
    pub average_wait_minutes: f64,
    /// Promedio de duración (fin - llegada) sobre el mismo conjunto
    pub average_duration_minutes: f64,
    /// Hora del día (0-23) con más creaciones de rides
    pub peak_hour: Option<u32>,
    /// Completados con batch / todos los completados × 100
    pub batch_efficiency: f64,
}

/// Agregación pura sobre un set de rides
pub fn aggregate(rides: &[RideRequest]) -> EventAnalytics {
    let total_rides = rides.len();
    let count_by = |status: RideStatus| rides.iter().filter(|r| r.status == status).count();

    let completed: Vec<&RideRequest> = rides
        .iter()
        .filter(|r| r.status == RideStatus::Completed)
        .collect();

    // Solo completados con ambos timestamps entran al promedio
    let mut wait_sum = 0.0;
    let mut duration_sum = 0.0;
    let mut timed = 0usize;
    for ride in &completed {
        if let (Some(arrival), Some(completion)) = (ride.arrival_timestamp, ride.completion_timestamp)
        {
            wait_sum += (arrival - ride.created_at).num_seconds() as f64 / 60.0;
            duration_sum += (completion - arrival).num_seconds() as f64 / 60.0;
            timed += 1;
        }
    }
    let (average_wait_minutes, average_duration_minutes) = if timed > 0 {
        (wait_sum / timed as f64, duration_sum / timed as f64)
    } else {
        (0.0, 0.0)
    };

    let peak_hour = {
        let mut by_hour = [0usize; 24];
        for ride in rides {
            by_hour[ride.created_at.hour() as usize] += 1;
        }
        by_hour
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .max_by_key(|(_, &count)| count)
            .map(|(hour, _)| hour as u32)
    };

    let batch_efficiency = if completed.is_empty() {
        0.0
    } else {
        let batched = completed.iter().filter(|r| r.batch_id.is_some()).count();
        batched as f64 / completed.len() as f64 * 100.0
    };

    EventAnalytics {
        total_rides,
        waiting_rides: count_by(RideStatus::Waiting),
        completed_rides: completed.len(),
        cancelled_rides: count_by(RideStatus::Cancelled),
        no_show_rides: count_by(RideStatus::NoShow),
        average_wait_minutes,
        average_duration_minutes,
        peak_hour,
        batch_efficiency,
    }
}

pub struct AnalyticsService {
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_event_analytics(&self, event_id: Uuid) -> Result<EventAnalytics, AppError> {
        let rides = RideRepository::new(self.pool.clone())
            .find_by_event(event_id)
            .await?;
        Ok(aggregate(&rides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ride(status: RideStatus) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            rider_name: "test".to_string(),
            pickup_address: "somewhere".to_string(),
            pickup_lat: 40.0,
            pickup_lng: -74.0,
            passenger_count: 1,
            status,
            assigned_driver_id: None,
            batch_id: None,
            batch_sequence: None,
            estimated_wait_minutes: None,
            driver_eta_minutes: None,
            arrival_timestamp: None,
            arrival_deadline: None,
            completion_timestamp: None,
            rider_confirmed: false,
            rider_hash: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        }
    }

    fn completed_ride(wait_min: i64, duration_min: i64) -> RideRequest {
        let mut r = ride(RideStatus::Completed);
        let arrival = r.created_at + Duration::minutes(wait_min);
        r.arrival_timestamp = Some(arrival);
        r.completion_timestamp = Some(arrival + Duration::minutes(duration_min));
        r
    }

    #[test]
    fn test_empty_set_is_all_zeroes() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_rides, 0);
        assert_eq!(stats.average_wait_minutes, 0.0);
        assert_eq!(stats.average_duration_minutes, 0.0);
        assert_eq!(stats.batch_efficiency, 0.0);
        assert!(stats.peak_hour.is_none());
    }

    #[test]
    fn test_average_wait_and_duration() {
        let rides = vec![completed_ride(10, 20), completed_ride(20, 10)];
        let stats = aggregate(&rides);
        assert!((stats.average_wait_minutes - 15.0).abs() < 1e-9);
        assert!((stats.average_duration_minutes - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_completed_without_timestamps_excluded_from_averages() {
        let rides = vec![completed_ride(10, 10), ride(RideStatus::Completed)];
        let stats = aggregate(&rides);
        assert_eq!(stats.completed_rides, 2);
        assert!((stats.average_wait_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_by_status() {
        let rides = vec![
            ride(RideStatus::Waiting),
            ride(RideStatus::Waiting),
            ride(RideStatus::Cancelled),
            ride(RideStatus::NoShow),
        ];
        let stats = aggregate(&rides);
        assert_eq!(stats.total_rides, 4);
        assert_eq!(stats.waiting_rides, 2);
        assert_eq!(stats.cancelled_rides, 1);
        assert_eq!(stats.no_show_rides, 1);
    }

    #[test]
    fn test_peak_hour() {
        let mut early = ride(RideStatus::Waiting);
        early.created_at = Utc.with_ymd_and_hms(2025, 6, 1, 21, 30, 0).unwrap();
        let rides = vec![ride(RideStatus::Waiting), ride(RideStatus::Waiting), early];
        let stats = aggregate(&rides);
        assert_eq!(stats.peak_hour, Some(22));
    }

    #[test]
    fn test_batch_efficiency() {
        let mut batched = completed_ride(5, 5);
        batched.batch_id = Some(Uuid::new_v4());
        let rides = vec![batched, completed_ride(5, 5)];
        let stats = aggregate(&rides);
        assert!((stats.batch_efficiency - 50.0).abs() < 1e-9);
    }
}
