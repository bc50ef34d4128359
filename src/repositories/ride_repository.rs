//! Repositorio de ride requests
//!
//! Todas las queries sobre la tabla ride_requests. Las escrituras
//! multi-fila del ciclo de vida viven en los services (transaccionales);
//! acá van los lookups y las escrituras de una sola fila.

use crate::models::{RideRequest, RideStatus};
use crate::utils::errors::AppError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        event_id: Uuid,
        rider_name: String,
        pickup_address: String,
        pickup_lat: f64,
        pickup_lng: f64,
        passenger_count: i32,
        rider_hash: Option<String>,
        estimated_wait_minutes: Option<i32>,
    ) -> Result<RideRequest, AppError> {
        let id = Uuid::new_v4();

        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            INSERT INTO ride_requests
                (id, event_id, rider_name, pickup_address, pickup_lat, pickup_lng,
                 passenger_count, status, estimated_wait_minutes, rider_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'waiting', $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(event_id)
        .bind(rider_name)
        .bind(pickup_address)
        .bind(pickup_lat)
        .bind(pickup_lng)
        .bind(passenger_count)
        .bind(estimated_wait_minutes)
        .bind(rider_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error creating ride: {}", e)))?;

        Ok(ride)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>("SELECT * FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error finding ride: {}", e)))?;

        Ok(ride)
    }

    pub async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            "SELECT * FROM ride_requests WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing rides: {}", e)))?;

        Ok(rides)
    }

    /// El ride en espera más antiguo del evento (orden de llegada)
    pub async fn find_oldest_waiting(&self, event_id: Uuid) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE event_id = $1 AND status = 'waiting'
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error finding oldest waiting ride: {}", e)))?;

        Ok(ride)
    }

    /// Rides en espera sin batch asignado, en orden de creación
    pub async fn find_waiting_unbatched(&self, event_id: Uuid) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE event_id = $1 AND status = 'waiting' AND batch_id IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing waiting rides: {}", e)))?;

        Ok(rides)
    }

    /// Posición en la cola de espera (1-based) de un ride en estado waiting
    pub async fn queue_position(
        &self,
        event_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM ride_requests
            WHERE event_id = $1 AND status = 'waiting' AND created_at <= $2
            "#,
        )
        .bind(event_id)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error computing queue position: {}", e)))?;

        Ok(result.0)
    }

    /// Sweep de no-shows: arrived, sin confirmar, con deadline vencido.
    /// Lo invoca un trigger externo periódico (~30s).
    pub async fn find_expired_no_show(&self) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE status = 'arrived' AND rider_confirmed = FALSE AND arrival_deadline < $1
            ORDER BY arrival_deadline ASC
            "#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing expired no-show rides: {}", e)))?;

        Ok(rides)
    }

    pub async fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            "SELECT * FROM ride_requests WHERE batch_id = $1 ORDER BY batch_sequence ASC",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing batch rides: {}", e)))?;

        Ok(rides)
    }

    /// Actualizar la ETA del conductor para un ride
    pub async fn update_driver_eta(&self, id: Uuid, eta_minutes: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE ride_requests SET driver_eta_minutes = $2 WHERE id = $1")
            .bind(id)
            .bind(eta_minutes)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error updating ride ETA: {}", e)))?;

        Ok(())
    }

    /// Rides de un evento filtrados por estado
    pub async fn find_by_status(
        &self,
        event_id: Uuid,
        status: RideStatus,
    ) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE event_id = $1 AND status = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing rides by status: {}", e)))?;

        Ok(rides)
    }
}
