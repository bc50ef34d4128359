use crate::controllers::dispatch_controller::DispatchController;
use crate::dto::dispatch_dto::{
    CompleteBatchRequest, DispatchAllResponse, DispatchRequest, MarkPickupRequest,
};
use crate::dto::response::ApiResponse;
use crate::models::RideBatch;
use crate::services::batch_service::{BatchDispatchSummary, PickupResult};
use crate::services::dispatch_service::DispatchAssignment;
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{extract::State, routing::post, Json, Router};

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new()
        .route("/smart", post(smart_dispatch))
        .route("/all", post(dispatch_all))
        .route("/batch", post(batch_dispatch))
        .route("/pickup", post(mark_pickup))
        .route("/complete-batch", post(complete_batch))
}

fn controller(state: &AppState) -> DispatchController {
    DispatchController::new(
        state.pool.clone(),
        state.config.clone(),
        state.changes.clone(),
    )
}

async fn smart_dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<ApiResponse<Option<DispatchAssignment>>>, AppError> {
    let response = controller(&state).smart(request.event_id).await?;
    Ok(Json(response))
}

async fn dispatch_all(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<ApiResponse<DispatchAllResponse>>, AppError> {
    let response = controller(&state).dispatch_all(request.event_id).await?;
    Ok(Json(response))
}

async fn batch_dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<ApiResponse<BatchDispatchSummary>>, AppError> {
    let response = controller(&state).batch(request.event_id).await?;
    Ok(Json(response))
}

async fn mark_pickup(
    State(state): State<AppState>,
    Json(request): Json<MarkPickupRequest>,
) -> Result<Json<ApiResponse<PickupResult>>, AppError> {
    let response = controller(&state).mark_pickup(request).await?;
    Ok(Json(response))
}

async fn complete_batch(
    State(state): State<AppState>,
    Json(request): Json<CompleteBatchRequest>,
) -> Result<Json<ApiResponse<RideBatch>>, AppError> {
    let response = controller(&state).complete_batch(request).await?;
    Ok(Json(response))
}
