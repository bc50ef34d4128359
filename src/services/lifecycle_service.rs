//! Máquina de estados del ciclo de vida de un ride
//!
//! Este service es el único camino por el cual cambia el status de un
//! ride: dispatch, batching y seguridad pasan todos por acá. Cada
//! transición corre en una transacción (update del ride + liberación del
//! conductor) con guard condicional sobre el estado actual, así dos
//! callers concurrentes no pueden ganar los dos.

use crate::config::environment::DispatchConfig;
use crate::models::{RideRequest, RideStatus};
use crate::utils::errors::AppError;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct LifecycleService {
    pool: PgPool,
    config: DispatchConfig,
}

impl LifecycleService {
    pub fn new(pool: PgPool, config: DispatchConfig) -> Self {
        Self { pool, config }
    }

    /// Aplicar una transición del ciclo de vida.
    ///
    /// Falla con InvalidTransition si el par (actual, destino) no está en
    /// la tabla, dejando el ride intacto. Efectos por estado destino:
    /// - assigned: setea assigned_driver_id (requiere driver_id)
    /// - arrived: estampa llegada + deadline de no-show, limpia confirmación
    /// - in_progress: setea rider_confirmed
    /// - completed: estampa completion_timestamp
    /// - terminales: liberan al conductor de un ride solo (los batches
    ///   liberan capacidad recién en complete_batch)
    pub async fn transition(
        &self,
        ride_id: Uuid,
        target: RideStatus,
        driver_id: Option<Uuid>,
    ) -> Result<RideRequest, AppError> {
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

        if !ride.status.can_transition_to(target) {
            return Err(AppError::InvalidTransition(format!(
                "Ride '{}' cannot go from '{}' to '{}'",
                ride_id, ride.status, target
            )));
        }

        let now = Utc::now();
        let updated = match target {
            RideStatus::Assigned => {
                let driver_id = driver_id.ok_or_else(|| {
                    AppError::BadRequest("driver_id is required to assign a ride".to_string())
                })?;
                sqlx::query_as::<_, RideRequest>(
                    r#"
                    UPDATE ride_requests
                    SET status = 'assigned', assigned_driver_id = $3
                    WHERE id = $1 AND status = $2
                    RETURNING *
                    "#,
                )
                .bind(ride_id)
                .bind(ride.status)
                .bind(driver_id)
                .fetch_optional(&mut *tx)
                .await
            }

            RideStatus::Arrived => {
                let deadline = now + Duration::minutes(self.config.no_show_window_minutes);
                sqlx::query_as::<_, RideRequest>(
                    r#"
                    UPDATE ride_requests
                    SET status = 'arrived', arrival_timestamp = $3,
                        arrival_deadline = $4, rider_confirmed = FALSE
                    WHERE id = $1 AND status = $2
                    RETURNING *
                    "#,
                )
                .bind(ride_id)
                .bind(ride.status)
                .bind(now)
                .bind(deadline)
                .fetch_optional(&mut *tx)
                .await
            }

            RideStatus::InProgress => {
                sqlx::query_as::<_, RideRequest>(
                    r#"
                    UPDATE ride_requests
                    SET status = 'in_progress', rider_confirmed = TRUE
                    WHERE id = $1 AND status = $2
                    RETURNING *
                    "#,
                )
                .bind(ride_id)
                .bind(ride.status)
                .fetch_optional(&mut *tx)
                .await
            }

            RideStatus::Completed => {
                sqlx::query_as::<_, RideRequest>(
                    r#"
                    UPDATE ride_requests
                    SET status = 'completed', completion_timestamp = $3,
                        assigned_driver_id = NULL
                    WHERE id = $1 AND status = $2
                    RETURNING *
                    "#,
                )
                .bind(ride_id)
                .bind(ride.status)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await
            }

            RideStatus::Cancelled | RideStatus::NoShow => {
                sqlx::query_as::<_, RideRequest>(
                    r#"
                    UPDATE ride_requests
                    SET status = $3, assigned_driver_id = NULL
                    WHERE id = $1 AND status = $2
                    RETURNING *
                    "#,
                )
                .bind(ride_id)
                .bind(ride.status)
                .bind(target)
                .fetch_optional(&mut *tx)
                .await
            }

            // Ningún estado transiciona de vuelta a waiting
            RideStatus::Waiting => {
                return Err(AppError::InvalidTransition(
                    "No state transitions back to 'waiting'".to_string(),
                ));
            }
        }
        .map_err(|e| AppError::Database(format!("Error applying transition: {}", e)))?
        .ok_or_else(|| {
            AppError::Conflict(format!("Ride '{}' was modified concurrently", ride_id))
        })?;

        // Terminales liberan al conductor de un ride solo. La capacidad de
        // un batch se libera recién en complete_batch.
        if target.is_terminal() && ride.batch_id.is_none() {
            if let Some(freed_driver) = driver_id.or(ride.assigned_driver_id) {
                sqlx::query(
                    r#"
                    UPDATE drivers
                    SET status = 'available', current_passenger_load = 0
                    WHERE id = $1 AND status = 'assigned'
                    "#,
                )
                .bind(freed_driver)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(format!("Error releasing driver: {}", e)))?;

                log::info!(
                    "🚗 Driver {} released by ride {} -> {}",
                    freed_driver,
                    ride_id,
                    target
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Error committing transition: {}", e)))?;

        log::info!("🔄 Ride {} transitioned {} -> {}", ride_id, ride.status, target);
        Ok(updated)
    }
}
