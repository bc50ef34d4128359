use crate::controllers::analytics_controller::AnalyticsController;
use crate::services::analytics_service::EventAnalytics;
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn create_analytics_router() -> Router<AppState> {
    Router::new().route("/:event_id", get(event_analytics))
}

async fn event_analytics(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventAnalytics>, AppError> {
    let controller = AnalyticsController::new(state.pool.clone());
    let response = controller.event_analytics(event_id).await?;
    Ok(Json(response))
}
