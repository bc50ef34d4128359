//! Controlador de analytics por evento

use crate::repositories::EventRepository;
use crate::services::analytics_service::{AnalyticsService, EventAnalytics};
use crate::utils::errors::AppError;
use sqlx::PgPool;
use uuid::Uuid;

pub struct AnalyticsController {
    pool: PgPool,
}

impl AnalyticsController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn event_analytics(&self, event_id: Uuid) -> Result<EventAnalytics, AppError> {
        EventRepository::new(self.pool.clone())
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event '{}' not found", event_id)))?;

        AnalyticsService::new(self.pool.clone())
            .get_event_analytics(event_id)
            .await
    }
}
