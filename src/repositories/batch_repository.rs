//! Repositorio de batches
//!
//! Queries sobre ride_batches y ride_batch_items. La creación atómica
//! de batch + items + rides vive en BatchService (transaccional).

use crate::models::{RideBatch, RideBatchItem};
use crate::utils::errors::AppError;
use sqlx::PgPool;
use uuid::Uuid;

pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RideBatch>, AppError> {
        let batch = sqlx::query_as::<_, RideBatch>("SELECT * FROM ride_batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error finding batch: {}", e)))?;

        Ok(batch)
    }

    /// Items del batch en orden de pickup
    pub async fn find_items(&self, batch_id: Uuid) -> Result<Vec<RideBatchItem>, AppError> {
        let items = sqlx::query_as::<_, RideBatchItem>(
            "SELECT * FROM ride_batch_items WHERE batch_id = $1 ORDER BY pickup_order_index ASC",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing batch items: {}", e)))?;

        Ok(items)
    }

    pub async fn find_item_by_id(&self, item_id: Uuid) -> Result<Option<RideBatchItem>, AppError> {
        let item =
            sqlx::query_as::<_, RideBatchItem>("SELECT * FROM ride_batch_items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Error finding batch item: {}", e)))?;

        Ok(item)
    }

    /// Item que referencia a un ride (posición del rider dentro de su batch)
    pub async fn find_item_for_ride(&self, ride_id: Uuid) -> Result<Option<RideBatchItem>, AppError> {
        let item = sqlx::query_as::<_, RideBatchItem>(
            "SELECT * FROM ride_batch_items WHERE ride_request_id = $1",
        )
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error finding batch item for ride: {}", e)))?;

        Ok(item)
    }

    /// Batch activo (pending o in_progress) de un conductor, si tiene
    pub async fn find_active_by_driver(&self, driver_id: Uuid) -> Result<Option<RideBatch>, AppError> {
        let batch = sqlx::query_as::<_, RideBatch>(
            r#"
            SELECT * FROM ride_batches
            WHERE driver_id = $1 AND status IN ('pending', 'in_progress')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error finding active batch: {}", e)))?;

        Ok(batch)
    }

    /// Cantidad de items todavía sin pickup
    pub async fn count_unpicked(&self, batch_id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM ride_batch_items WHERE batch_id = $1 AND picked_up = FALSE",
        )
        .bind(batch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error counting unpicked items: {}", e)))?;

        Ok(result.0)
    }

    pub async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<RideBatch>, AppError> {
        let batches = sqlx::query_as::<_, RideBatch>(
            "SELECT * FROM ride_batches WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing batches: {}", e)))?;

        Ok(batches)
    }
}
