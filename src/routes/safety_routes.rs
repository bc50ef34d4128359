use crate::controllers::safety_controller::SafetyController;
use crate::dto::response::ApiResponse;
use crate::dto::ride_dto::RideResponse;
use crate::dto::safety_dto::{ConsentRequest, CooldownQuery, EmergencyRequest, NoShowRequest};
use crate::models::{EmergencyEvent, RiderConsent};
use crate::services::safety_service::CooldownStatus;
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

pub fn create_safety_router() -> Router<AppState> {
    Router::new()
        .route("/expired", get(expired_no_shows))
        .route("/no-show", post(process_no_show))
        .route("/cooldown", get(cooldown_status))
        .route("/consent", post(record_consent))
        .route("/emergency", post(trigger_emergency))
}

fn controller(state: &AppState) -> SafetyController {
    SafetyController::new(
        state.pool.clone(),
        state.config.clone(),
        state.changes.clone(),
    )
}

async fn expired_no_shows(
    State(state): State<AppState>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let response = controller(&state).expired_no_shows().await?;
    Ok(Json(response))
}

async fn process_no_show(
    State(state): State<AppState>,
    Json(request): Json<NoShowRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).process_no_show(request).await?;
    Ok(Json(response))
}

async fn cooldown_status(
    State(state): State<AppState>,
    Query(query): Query<CooldownQuery>,
) -> Result<Json<CooldownStatus>, AppError> {
    let response = controller(&state).cooldown_status(query).await?;
    Ok(Json(response))
}

async fn record_consent(
    State(state): State<AppState>,
    Json(request): Json<ConsentRequest>,
) -> Result<Json<ApiResponse<RiderConsent>>, AppError> {
    let response = controller(&state).record_consent(request).await?;
    Ok(Json(response))
}

async fn trigger_emergency(
    State(state): State<AppState>,
    Json(request): Json<EmergencyRequest>,
) -> Result<Json<ApiResponse<EmergencyEvent>>, AppError> {
    let response = controller(&state).trigger_emergency(request).await?;
    Ok(Json(response))
}
