use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{
    ActiveBatchResponse, CreateDriverRequest, DriverLocationRequest, DriverOnlineRequest,
    DriverResponse, ListDriversQuery,
};
use crate::dto::response::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_driver))
        .route("/", get(list_drivers))
        .route("/:id", get(get_driver))
        .route("/:id", delete(delete_driver))
        .route("/:id/location", post(update_location))
        .route("/:id/online", post(set_online))
        .route("/:id/batch", get(active_batch))
}

fn controller(state: &AppState) -> DriverController {
    DriverController::new(state.pool.clone(), state.changes.clone())
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverResponse>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_drivers(
    State(state): State<AppState>,
    Query(query): Query<ListDriversQuery>,
) -> Result<Json<Vec<DriverResponse>>, AppError> {
    let response = controller(&state).list_by_event(query.event_id).await?;
    Ok(Json(response))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverLocationRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let response = controller(&state).update_location(id, request).await?;
    Ok(Json(response))
}

async fn set_online(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverOnlineRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let response = controller(&state).set_online(id, request).await?;
    Ok(Json(response))
}

async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    controller(&state).delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Conductor eliminado exitosamente"
    })))
}

async fn active_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActiveBatchResponse>, AppError> {
    let response = controller(&state).active_batch(id).await?;
    Ok(Json(response))
}
