//! Motor de seguridad / no-show
//!
//! Deadlines de llegada, confirmación de presencia del rider, penalidades
//! pseudónimas y cooldowns. El sweep de vencidos lo dispara un trigger
//! externo periódico; este core no se auto-agenda.

use crate::config::environment::DispatchConfig;
use crate::models::{EmergencyEvent, RideRequest, RideStatus, RiderConsent, RiderPenalty};
use crate::repositories::{RideRepository, SafetyRepository};
use crate::services::lifecycle_service::LifecycleService;
use crate::utils::errors::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Estado de cooldown de un rider
#[derive(Debug, Clone, Serialize)]
pub struct CooldownStatus {
    pub is_in_cooldown: bool,
    pub remaining_minutes: i64,
}

/// Avanzar el contador de no-shows. Al alcanzar el umbral se setea el
/// cooldown y el contador vuelve a 0: un ciclo de penalidad = un cooldown.
pub fn apply_no_show_penalty(
    current_count: i32,
    now: DateTime<Utc>,
    config: &DispatchConfig,
) -> (i32, Option<DateTime<Utc>>) {
    let next = current_count + 1;
    if next >= config.no_show_threshold {
        (0, Some(now + Duration::minutes(config.cooldown_minutes)))
    } else {
        (next, None)
    }
}

/// Condición de no-show vencido: el conductor llegó, el rider nunca
/// confirmó y el deadline de llegada ya pasó.
pub fn no_show_expired(ride: &RideRequest, now: DateTime<Utc>) -> bool {
    ride.status == RideStatus::Arrived
        && !ride.rider_confirmed
        && ride.arrival_deadline.is_some_and(|deadline| deadline < now)
}

/// Un deadline pasado cuenta como "sin cooldown" sin necesidad de limpiar
/// el registro.
pub fn cooldown_status_at(
    cooldown_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CooldownStatus {
    match cooldown_until {
        Some(until) if until > now => {
            let remaining = until - now;
            // Redondeo hacia arriba: un cooldown recién seteado reporta
            // los minutos completos
            let minutes = (remaining.num_seconds() + 59) / 60;
            CooldownStatus {
                is_in_cooldown: true,
                remaining_minutes: minutes,
            }
        }
        _ => CooldownStatus {
            is_in_cooldown: false,
            remaining_minutes: 0,
        },
    }
}

pub struct SafetyService {
    pool: PgPool,
    config: DispatchConfig,
}

impl SafetyService {
    pub fn new(pool: PgPool, config: DispatchConfig) -> Self {
        Self { pool, config }
    }

    fn rides(&self) -> RideRepository {
        RideRepository::new(self.pool.clone())
    }

    fn safety(&self) -> SafetyRepository {
        SafetyRepository::new(self.pool.clone())
    }

    fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.pool.clone(), self.config.clone())
    }

    /// El rider confirmó su presencia: arrived → in_progress. Si el ride
    /// no está en arrived la operación es un no-op silencioso.
    pub async fn confirm_rider_presence(
        &self,
        ride_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let Some(ride) = self.rides().find_by_id(ride_id).await? else {
            return Ok(None);
        };

        if ride.status != RideStatus::Arrived {
            log::debug!(
                "🤷 confirm_rider_presence ignored for ride {} in status {}",
                ride_id,
                ride.status
            );
            return Ok(None);
        }

        let updated = self
            .lifecycle()
            .transition(ride_id, RideStatus::InProgress, None)
            .await?;
        Ok(Some(updated))
    }

    /// Rides elegibles para el sweep de no-shows. La query prefiltra en
    /// SQL; el predicado decide sobre un único instante.
    pub async fn get_expired_no_show_rides(&self) -> Result<Vec<RideRequest>, AppError> {
        let rides = self.rides().find_expired_no_show().await?;
        let now = Utc::now();
        Ok(rides.into_iter().filter(|r| no_show_expired(r, now)).collect())
    }

    /// Procesar un no-show: ride a no_show, conductor liberado y
    /// penalidad acumulada, todo en una transacción.
    pub async fn process_no_show(&self, ride_id: Uuid) -> Result<RideRequest, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Error starting transaction: {}", e)))?;

        let ride = sqlx::query_as::<_, RideRequest>(
            "SELECT * FROM ride_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(ride_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error loading ride: {}", e)))?
        .ok_or_else(|| AppError::NotFound(format!("Ride '{}' not found", ride_id)))?;

        if !ride.status.can_transition_to(RideStatus::NoShow) {
            return Err(AppError::InvalidTransition(format!(
                "Ride '{}' cannot go from '{}' to 'no_show'",
                ride_id, ride.status
            )));
        }

        let updated = sqlx::query_as::<_, RideRequest>(
            r#"
            UPDATE ride_requests
            SET status = 'no_show', assigned_driver_id = NULL
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(ride_id)
        .bind(ride.status)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error marking no-show: {}", e)))?
        .ok_or_else(|| {
            AppError::Conflict(format!("Ride '{}' was modified concurrently", ride_id))
        })?;

        if let Some(driver_id) = ride.assigned_driver_id {
            sqlx::query(
                r#"
                UPDATE drivers SET status = 'available', current_passenger_load = 0
                WHERE id = $1 AND status = 'assigned'
                "#,
            )
            .bind(driver_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error releasing driver: {}", e)))?;
        }

        // Penalidad solo si el ride trae hash pseudónimo
        if let Some(rider_hash) = &ride.rider_hash {
            let existing = sqlx::query_as::<_, RiderPenalty>(
                "SELECT * FROM rider_penalties WHERE event_id = $1 AND rider_hash = $2 FOR UPDATE",
            )
            .bind(ride.event_id)
            .bind(rider_hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error loading penalty: {}", e)))?;

            let current = existing.map(|p| p.no_show_count).unwrap_or(0);
            let now = Utc::now();
            let (new_count, cooldown_until) = apply_no_show_penalty(current, now, &self.config);

            sqlx::query(
                r#"
                INSERT INTO rider_penalties (id, event_id, rider_hash, no_show_count, cooldown_until, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (event_id, rider_hash)
                DO UPDATE SET no_show_count = $4, cooldown_until = $5, updated_at = $6
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(ride.event_id)
            .bind(rider_hash)
            .bind(new_count)
            .bind(cooldown_until)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error upserting penalty: {}", e)))?;

            if cooldown_until.is_some() {
                log::warn!(
                    "⏳ Rider {} entered cooldown on event {}",
                    rider_hash,
                    ride.event_id
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Error committing no-show: {}", e)))?;

        log::info!("🚫 Ride {} marked as no-show", ride_id);
        Ok(updated)
    }

    /// Estado de cooldown de un rider; un deadline vencido se reporta
    /// como inactivo sin escribir nada.
    pub async fn get_cooldown_status(
        &self,
        event_id: Uuid,
        rider_hash: &str,
    ) -> Result<CooldownStatus, AppError> {
        let penalty = self.safety().find_penalty(event_id, rider_hash).await?;
        Ok(cooldown_status_at(
            penalty.and_then(|p| p.cooldown_until),
            Utc::now(),
        ))
    }

    pub async fn record_consent(
        &self,
        event_id: Uuid,
        rider_hash: &str,
    ) -> Result<RiderConsent, AppError> {
        self.safety().record_consent(event_id, rider_hash).await
    }

    pub async fn has_consent(&self, event_id: Uuid, rider_hash: &str) -> Result<bool, AppError> {
        self.safety().has_consent(event_id, rider_hash).await
    }

    /// Registrar una emergencia. Independiente del estado del dispatch;
    /// la notificación saliente es trabajo del colaborador.
    pub async fn trigger_emergency(
        &self,
        event_id: Uuid,
        ride_request_id: Option<Uuid>,
        rider_hash: Option<String>,
        details: Option<String>,
    ) -> Result<EmergencyEvent, AppError> {
        let emergency = self
            .safety()
            .insert_emergency(event_id, ride_request_id, rider_hash, details)
            .await?;

        log::error!("🚨 Emergency {} recorded for event {}", emergency.id, event_id);
        Ok(emergency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DispatchConfig {
        DispatchConfig::default()
    }

    #[test]
    fn test_penalty_below_threshold_increments() {
        let now = Utc::now();
        let (count, cooldown) = apply_no_show_penalty(0, now, &config());
        assert_eq!(count, 1);
        assert!(cooldown.is_none());
    }

    #[test]
    fn test_penalty_at_threshold_sets_cooldown_and_resets() {
        let now = Utc::now();
        // Segundo no-show: umbral 2 alcanzado
        let (count, cooldown) = apply_no_show_penalty(1, now, &config());
        assert_eq!(count, 0);
        let until = cooldown.expect("cooldown must be set at threshold");
        assert_eq!(until, now + Duration::minutes(15));
    }

    #[test]
    fn test_penalty_cycle_repeats_after_reset() {
        let now = Utc::now();
        let (count, cooldown) = apply_no_show_penalty(0, now, &config());
        assert_eq!((count, cooldown.is_none()), (1, true));
        let (count, cooldown) = apply_no_show_penalty(count, now, &config());
        assert_eq!((count, cooldown.is_some()), (0, true));
    }

    #[test]
    fn test_cooldown_active_reports_remaining_minutes() {
        let now = Utc::now();
        let status = cooldown_status_at(Some(now + Duration::minutes(15)), now);
        assert!(status.is_in_cooldown);
        assert!(status.remaining_minutes > 0 && status.remaining_minutes <= 15);
    }

    #[test]
    fn test_cooldown_expired_is_inactive_without_cleanup() {
        let now = Utc::now();
        let status = cooldown_status_at(Some(now - Duration::seconds(1)), now);
        assert!(!status.is_in_cooldown);
        assert_eq!(status.remaining_minutes, 0);
    }

    #[test]
    fn test_cooldown_absent_is_inactive() {
        let status = cooldown_status_at(None, Utc::now());
        assert!(!status.is_in_cooldown);
    }

    fn arrived_ride(deadline_offset_secs: i64, now: DateTime<Utc>) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            rider_name: "test".to_string(),
            pickup_address: "somewhere".to_string(),
            pickup_lat: 40.0,
            pickup_lng: -74.0,
            passenger_count: 1,
            status: RideStatus::Arrived,
            assigned_driver_id: Some(Uuid::new_v4()),
            batch_id: None,
            batch_sequence: None,
            estimated_wait_minutes: None,
            driver_eta_minutes: None,
            arrival_timestamp: Some(now - Duration::minutes(5)),
            arrival_deadline: Some(now + Duration::seconds(deadline_offset_secs)),
            completion_timestamp: None,
            rider_confirmed: false,
            rider_hash: None,
            created_at: now - Duration::minutes(10),
        }
    }

    #[test]
    fn test_no_show_expired_past_deadline() {
        let now = Utc::now();
        assert!(no_show_expired(&arrived_ride(-1, now), now));
    }

    #[test]
    fn test_no_show_not_expired_before_deadline() {
        let now = Utc::now();
        assert!(!no_show_expired(&arrived_ride(60, now), now));
    }

    #[test]
    fn test_confirmed_rider_never_expires() {
        let now = Utc::now();
        let mut ride = arrived_ride(-60, now);
        ride.rider_confirmed = true;
        assert!(!no_show_expired(&ride, now));
    }

    #[test]
    fn test_only_arrived_rides_expire() {
        let now = Utc::now();
        let mut ride = arrived_ride(-60, now);
        ride.status = RideStatus::InProgress;
        assert!(!no_show_expired(&ride, now));
    }

    #[test]
    fn test_ride_without_deadline_never_expires() {
        let now = Utc::now();
        let mut ride = arrived_ride(-60, now);
        ride.arrival_deadline = None;
        assert!(!no_show_expired(&ride, now));
    }
}
