//! Repositorio del motor de seguridad
//!
//! Consentimientos, registros de emergencia y lecturas de penalidades.
//! La escritura de penalidades vive en SafetyService::process_no_show
//! (transaccional, junto al cambio de estado del ride).

use crate::models::{EmergencyEvent, RiderConsent, RiderPenalty};
use crate::utils::errors::AppError;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct SafetyRepository {
    pool: PgPool,
}

impl SafetyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_penalty(
        &self,
        event_id: Uuid,
        rider_hash: &str,
    ) -> Result<Option<RiderPenalty>, AppError> {
        let penalty = sqlx::query_as::<_, RiderPenalty>(
            "SELECT * FROM rider_penalties WHERE event_id = $1 AND rider_hash = $2",
        )
        .bind(event_id)
        .bind(rider_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error finding rider penalty: {}", e)))?;

        Ok(penalty)
    }

    pub async fn record_consent(
        &self,
        event_id: Uuid,
        rider_hash: &str,
    ) -> Result<RiderConsent, AppError> {
        let consent = sqlx::query_as::<_, RiderConsent>(
            r#"
            INSERT INTO rider_consents (id, event_id, rider_hash, consented_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, rider_hash) DO UPDATE SET consented_at = rider_consents.consented_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(rider_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error recording consent: {}", e)))?;

        Ok(consent)
    }

    pub async fn has_consent(&self, event_id: Uuid, rider_hash: &str) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM rider_consents WHERE event_id = $1 AND rider_hash = $2)",
        )
        .bind(event_id)
        .bind(rider_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error checking consent: {}", e)))?;

        Ok(result.0)
    }

    pub async fn insert_emergency(
        &self,
        event_id: Uuid,
        ride_request_id: Option<Uuid>,
        rider_hash: Option<String>,
        details: Option<String>,
    ) -> Result<EmergencyEvent, AppError> {
        let emergency = sqlx::query_as::<_, EmergencyEvent>(
            r#"
            INSERT INTO emergency_events (id, event_id, ride_request_id, rider_hash, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(ride_request_id)
        .bind(rider_hash)
        .bind(details)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error inserting emergency event: {}", e)))?;

        Ok(emergency)
    }
}
