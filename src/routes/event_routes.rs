use crate::controllers::event_controller::EventController;
use crate::dto::event_dto::CreateEventRequest;
use crate::dto::response::ApiResponse;
use crate::models::Event;
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn create_event_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route("/:id", get(get_event))
        .route("/:id/close", post(close_event))
}

async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let controller = EventController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    let controller = EventController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn close_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let controller = EventController::new(state.pool.clone());
    let response = controller.close(id).await?;
    Ok(Json(response))
}
