//! Controlador de ride requests
//!
//! Orquesta la creación y el ciclo de vida de rides: verifica evento
//! activo, consentimiento y cooldown antes de encolar, y publica los
//! eventos de cambio después de cada mutación.

use crate::config::environment::EnvironmentConfig;
use crate::dto::response::ApiResponse;
use crate::dto::ride_dto::{
    BatchPositionResponse, CreateRideRequest, QueuePositionResponse, RideResponse,
};
use crate::models::{RideRequest, RideStatus};
use crate::repositories::{EventRepository, RideRepository};
use crate::services::batch_service::BatchService;
use crate::services::change_feed::{ChangeEvent, ChangeFeed, EntityKind};
use crate::services::dispatch_service::{estimated_wait_for_position, DispatchService};
use crate::services::eta_service::EtaService;
use crate::services::lifecycle_service::LifecycleService;
use crate::services::safety_service::SafetyService;
use crate::utils::errors::AppError;
use crate::utils::validation::{rider_hash, validate_latitude, validate_longitude, validate_not_empty};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct RideController {
    pool: PgPool,
    config: EnvironmentConfig,
    changes: ChangeFeed,
}

impl RideController {
    pub fn new(pool: PgPool, config: EnvironmentConfig, changes: ChangeFeed) -> Self {
        Self {
            pool,
            config,
            changes,
        }
    }

    fn rides(&self) -> RideRepository {
        RideRepository::new(self.pool.clone())
    }

    fn events(&self) -> EventRepository {
        EventRepository::new(self.pool.clone())
    }

    fn safety(&self) -> SafetyService {
        SafetyService::new(self.pool.clone(), self.config.dispatch.clone())
    }

    fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.pool.clone(), self.config.dispatch.clone())
    }

    pub async fn create(
        &self,
        request: CreateRideRequest,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        request.validate()?;

        // Validar campos que el derive no cubre
        validate_not_empty(&request.rider_name)
            .map_err(|_| AppError::BadRequest("El nombre del rider es requerido".to_string()))?;
        validate_not_empty(&request.pickup_address)
            .map_err(|_| AppError::BadRequest("La dirección de pickup es requerida".to_string()))?;
        validate_latitude(request.pickup_lat)
            .map_err(|_| AppError::BadRequest("Latitud de pickup fuera de rango".to_string()))?;
        validate_longitude(request.pickup_lng)
            .map_err(|_| AppError::BadRequest("Longitud de pickup fuera de rango".to_string()))?;

        // Verificar que el evento exista y esté activo
        let event = self
            .events()
            .find_by_id(request.event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Event '{}' not found", request.event_id))
            })?;

        if !event.is_active {
            return Err(AppError::Forbidden(
                "El evento está cerrado, no se aceptan nuevos rides".to_string(),
            ));
        }

        let hash = rider_hash(request.event_id, &request.rider_name, &request.pickup_address);

        // Sin consentimiento de seguridad no hay ride
        if !self.safety().has_consent(request.event_id, &hash).await? {
            return Err(AppError::Forbidden(
                "Se requiere consentimiento de seguridad antes de pedir un ride".to_string(),
            ));
        }

        // Riders en cooldown no pueden encolar
        let cooldown = self
            .safety()
            .get_cooldown_status(request.event_id, &hash)
            .await?;
        if cooldown.is_in_cooldown {
            return Err(AppError::Forbidden(format!(
                "Rider en cooldown por {} minutos más",
                cooldown.remaining_minutes
            )));
        }

        // Estimación inicial por posición en cola (el nuevo ride entra último)
        let waiting = self
            .rides()
            .find_by_status(request.event_id, RideStatus::Waiting)
            .await?;
        let position = waiting.len() as i64 + 1;
        let estimated_wait = estimated_wait_for_position(position, &self.config.dispatch);

        let ride = self
            .rides()
            .create(
                request.event_id,
                request.rider_name,
                request.pickup_address,
                request.pickup_lat,
                request.pickup_lng,
                request.passenger_count,
                Some(hash),
                Some(estimated_wait),
            )
            .await?;

        self.changes.publish(ChangeEvent::Inserted {
            entity: EntityKind::RideRequest,
            id: ride.id,
            event_id: ride.event_id,
        });

        log::info!("🚕 Ride {} queued at position {}", ride.id, position);

        Ok(ApiResponse::success_with_message(
            RideResponse::from(ride),
            "Ride request creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<RideResponse, AppError> {
        let ride = self.find_ride(id).await?;
        Ok(RideResponse::from(ride))
    }

    pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<RideResponse>, AppError> {
        let rides = self.rides().find_by_event(event_id).await?;
        Ok(rides.into_iter().map(RideResponse::from).collect())
    }

    /// Cancelación por parte del rider. Pasa por el camino único de
    /// transiciones: estados terminales o en viaje la rechazan.
    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<RideResponse>, AppError> {
        let updated = self
            .lifecycle()
            .transition(id, RideStatus::Cancelled, None)
            .await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::RideRequest,
            id: updated.id,
            event_id: updated.event_id,
        });

        Ok(ApiResponse::success_with_message(
            RideResponse::from(updated),
            "Ride cancelado".to_string(),
        ))
    }

    /// El rider confirmó que está en el punto de pickup
    pub async fn confirm_presence(&self, id: Uuid) -> Result<ApiResponse<RideResponse>, AppError> {
        let ride = self.find_ride(id).await?;

        match self.safety().confirm_rider_presence(id).await? {
            Some(updated) => {
                self.changes.publish(ChangeEvent::Updated {
                    entity: EntityKind::RideRequest,
                    id: updated.id,
                    event_id: updated.event_id,
                });

                Ok(ApiResponse::success_with_message(
                    RideResponse::from(updated),
                    "Presencia confirmada, viaje en curso".to_string(),
                ))
            }
            // Fuera de arrived la confirmación es un no-op
            None => Ok(ApiResponse::success_with_message(
                RideResponse::from(ride),
                "El ride no espera confirmación en su estado actual".to_string(),
            )),
        }
    }

    pub async fn queue_position(&self, id: Uuid) -> Result<QueuePositionResponse, AppError> {
        let ride = self.find_ride(id).await?;

        if ride.status != RideStatus::Waiting {
            return Err(AppError::BadRequest(format!(
                "El ride '{}' no está en cola (estado actual: {})",
                id, ride.status
            )));
        }

        let position = self
            .rides()
            .queue_position(ride.event_id, ride.created_at)
            .await?;

        Ok(QueuePositionResponse {
            ride_id: ride.id,
            position,
            estimated_wait_minutes: estimated_wait_for_position(position, &self.config.dispatch),
        })
    }

    pub async fn batch_position(&self, id: Uuid) -> Result<BatchPositionResponse, AppError> {
        // Asegurar 404 coherente si el ride no existe
        self.find_ride(id).await?;

        let service = BatchService::new(self.pool.clone(), self.config.dispatch.clone());
        let (item, batch, total, picked) = service
            .batch_position_for_ride(id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("El ride '{}' no pertenece a ningún batch", id))
            })?;

        Ok(BatchPositionResponse {
            batch_id: batch.id,
            batch_status: batch.status,
            pickup_order_index: item.pickup_order_index,
            total_stops: total,
            picked_up_count: picked,
            estimated_arrival_time: item.estimated_arrival_time,
            picked_up: item.picked_up,
        })
    }

    /// Recalcular la ETA del conductor con el proveedor externo (con
    /// fallback heurístico) y persistirla.
    pub async fn refresh_eta(&self, id: Uuid) -> Result<ApiResponse<RideResponse>, AppError> {
        let eta_service = EtaService::new(
            self.config.dispatch.clone(),
            self.config.mapbox_token.clone(),
        );
        let dispatch = DispatchService::new(self.pool.clone(), self.config.dispatch.clone());
        dispatch.update_ride_eta(&eta_service, id).await?;

        let ride = self.find_ride(id).await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::RideRequest,
            id: ride.id,
            event_id: ride.event_id,
        });

        Ok(ApiResponse::success_with_message(
            RideResponse::from(ride),
            "ETA actualizada".to_string(),
        ))
    }

    async fn find_ride(&self, id: Uuid) -> Result<RideRequest, AppError> {
        self.rides()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride '{}' not found", id)))
    }
}
