//! Controlador de eventos
//!
//! Un evento delimita el mundo del dispatch: rides, conductores y
//! penalidades viven siempre dentro de uno.

use crate::dto::event_dto::CreateEventRequest;
use crate::dto::response::ApiResponse;
use crate::models::Event;
use crate::repositories::EventRepository;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_not_empty;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct EventController {
    repository: EventRepository,
}

impl EventController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: EventRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateEventRequest,
    ) -> Result<ApiResponse<Event>, AppError> {
        request.validate()?;
        validate_not_empty(&request.name)
            .map_err(|_| AppError::BadRequest("El nombre del evento es requerido".to_string()))?;

        let event = self.repository.create(request.name).await?;

        log::info!("🎪 Event {} created: {}", event.id, event.name);

        Ok(ApiResponse::success_with_message(
            event,
            "Evento creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Event, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event '{}' not found", id)))
    }

    /// Cerrar el evento: no se aceptan más rides ni conductores nuevos
    pub async fn close(&self, id: Uuid) -> Result<ApiResponse<Event>, AppError> {
        self.get_by_id(id).await?;
        let event = self.repository.set_active(id, false).await?;

        log::info!("🏁 Event {} closed", event.id);

        Ok(ApiResponse::success_with_message(
            event,
            "Evento cerrado".to_string(),
        ))
    }
}
