use crate::controllers::ride_controller::RideController;
use crate::dto::response::ApiResponse;
use crate::dto::ride_dto::{
    BatchPositionResponse, CreateRideRequest, QueuePositionResponse, RideResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn create_ride_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ride))
        .route("/:id", get(get_ride))
        .route("/:id/cancel", post(cancel_ride))
        .route("/:id/confirm-presence", post(confirm_presence))
        .route("/:id/queue-position", get(queue_position))
        .route("/:id/batch-position", get(batch_position))
        .route("/:id/eta/refresh", post(refresh_eta))
        .route("/event/:event_id", get(list_rides))
}

fn controller(state: &AppState) -> RideController {
    RideController::new(
        state.pool.clone(),
        state.config.clone(),
        state.changes.clone(),
    )
}

async fn create_ride(
    State(state): State<AppState>,
    Json(request): Json<CreateRideRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_rides(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let response = controller(&state).list_by_event(event_id).await?;
    Ok(Json(response))
}

async fn cancel_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).cancel(id).await?;
    Ok(Json(response))
}

async fn confirm_presence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).confirm_presence(id).await?;
    Ok(Json(response))
}

async fn queue_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueuePositionResponse>, AppError> {
    let response = controller(&state).queue_position(id).await?;
    Ok(Json(response))
}

async fn batch_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchPositionResponse>, AppError> {
    let response = controller(&state).batch_position(id).await?;
    Ok(Json(response))
}

async fn refresh_eta(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).refresh_eta(id).await?;
    Ok(Json(response))
}
