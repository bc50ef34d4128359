//! Repositorio de eventos

use crate::models::Event;
use crate::utils::errors::AppError;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: String) -> Result<Event, AppError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, name, is_active, created_at)
            VALUES ($1, $2, TRUE, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error creating event: {}", e)))?;

        Ok(event)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error finding event: {}", e)))?;

        Ok(event)
    }

    /// Cerrar un evento: deja de aceptar ride requests
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Event, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error updating event: {}", e)))?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        Ok(event)
    }
}
