//! Controlador de conductores
//!
//! Alta, presencia (online/offline), ubicación y vista del batch activo.

use crate::dto::driver_dto::{
    ActiveBatchResponse, BatchStopDetail, CreateDriverRequest, DriverLocationRequest,
    DriverOnlineRequest, DriverResponse,
};
use crate::dto::response::ApiResponse;
use crate::models::Driver;
use crate::repositories::{BatchRepository, DriverRepository, EventRepository, RideRepository};
use crate::services::change_feed::{ChangeEvent, ChangeFeed, EntityKind};
use crate::utils::errors::AppError;
use crate::utils::validation::validate_not_empty;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_CAPACITY: i32 = 4;

pub struct DriverController {
    pool: PgPool,
    changes: ChangeFeed,
}

impl DriverController {
    pub fn new(pool: PgPool, changes: ChangeFeed) -> Self {
        Self { pool, changes }
    }

    fn drivers(&self) -> DriverRepository {
        DriverRepository::new(self.pool.clone())
    }

    fn batches(&self) -> BatchRepository {
        BatchRepository::new(self.pool.clone())
    }

    pub async fn create(
        &self,
        request: CreateDriverRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;
        validate_not_empty(&request.driver_name)
            .map_err(|_| AppError::BadRequest("El nombre del conductor es requerido".to_string()))?;

        let event = EventRepository::new(self.pool.clone())
            .find_by_id(request.event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Event '{}' not found", request.event_id))
            })?;

        if !event.is_active {
            return Err(AppError::Forbidden(
                "El evento está cerrado, no se registran conductores".to_string(),
            ));
        }

        let driver = self
            .drivers()
            .create(
                request.event_id,
                request.driver_name,
                request.max_capacity.unwrap_or(DEFAULT_CAPACITY),
            )
            .await?;

        self.changes.publish(ChangeEvent::Inserted {
            entity: EntityKind::Driver,
            id: driver.id,
            event_id: driver.event_id,
        });

        log::info!("✅ Driver {} registered for event {}", driver.id, driver.event_id);

        Ok(ApiResponse::success_with_message(
            DriverResponse::from(driver),
            "Conductor registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DriverResponse, AppError> {
        let driver = self.find_driver(id).await?;
        Ok(DriverResponse::from(driver))
    }

    pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<DriverResponse>, AppError> {
        let drivers = self.drivers().find_by_event(event_id).await?;
        Ok(drivers.into_iter().map(DriverResponse::from).collect())
    }

    pub async fn update_location(
        &self,
        id: Uuid,
        request: DriverLocationRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;

        let driver = self.find_driver(id).await?;
        self.drivers()
            .update_location(id, request.lat, request.lng)
            .await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::Driver,
            id,
            event_id: driver.event_id,
        });

        let updated = self.find_driver(id).await?;
        Ok(ApiResponse::success_with_message(
            DriverResponse::from(updated),
            "Ubicación actualizada".to_string(),
        ))
    }

    /// Cambiar presencia. Un conductor con batch o ride activo no puede
    /// desconectarse (el guard vive en el repositorio).
    pub async fn set_online(
        &self,
        id: Uuid,
        request: DriverOnlineRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        let driver = self.drivers().set_online(id, request.online).await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::Driver,
            id: driver.id,
            event_id: driver.event_id,
        });

        log::info!(
            "🔄 Driver {} is now {}",
            driver.id,
            if driver.is_online { "online" } else { "offline" }
        );

        Ok(ApiResponse::success_with_message(
            DriverResponse::from(driver),
            "Presencia actualizada".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let driver = self.find_driver(id).await?;
        self.drivers().delete(id).await?;

        self.changes.publish(ChangeEvent::Deleted {
            entity: EntityKind::Driver,
            id,
            event_id: driver.event_id,
        });

        Ok(())
    }

    /// Batch pendiente o en curso del conductor, con las paradas en orden
    /// de pickup y los datos de cada rider.
    pub async fn active_batch(&self, id: Uuid) -> Result<ActiveBatchResponse, AppError> {
        self.find_driver(id).await?;

        let batch = self
            .batches()
            .find_active_by_driver(id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("El conductor '{}' no tiene batch activo", id))
            })?;

        let items = self.batches().find_items(batch.id).await?;
        let rides = RideRepository::new(self.pool.clone())
            .find_by_batch(batch.id)
            .await?;

        let mut stops = Vec::with_capacity(items.len());
        for item in &items {
            let ride = rides
                .iter()
                .find(|r| r.id == item.ride_request_id)
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Batch item {} references missing ride {}",
                        item.id, item.ride_request_id
                    ))
                })?;
            stops.push(BatchStopDetail::from_parts(item, ride));
        }

        Ok(ActiveBatchResponse { batch, stops })
    }

    async fn find_driver(&self, id: Uuid) -> Result<Driver, AppError> {
        self.drivers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver '{}' not found", id)))
    }
}
