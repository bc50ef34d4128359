//! Controlador de los triggers de dispatch
//!
//! Los tres disparos externos del motor: asignación individual, barrido
//! completo y batching por clusters. El motor nunca se auto-agenda; estos
//! endpoints son el único punto de entrada.

use crate::config::environment::EnvironmentConfig;
use crate::dto::dispatch_dto::{CompleteBatchRequest, DispatchAllResponse, MarkPickupRequest};
use crate::dto::response::ApiResponse;
use crate::models::RideBatch;
use crate::services::batch_service::{BatchDispatchSummary, BatchService, PickupResult};
use crate::services::change_feed::{ChangeEvent, ChangeFeed, EntityKind};
use crate::services::dispatch_service::{DispatchAssignment, DispatchService};
use crate::utils::errors::AppError;
use sqlx::PgPool;
use uuid::Uuid;

pub struct DispatchController {
    pool: PgPool,
    config: EnvironmentConfig,
    changes: ChangeFeed,
}

impl DispatchController {
    pub fn new(pool: PgPool, config: EnvironmentConfig, changes: ChangeFeed) -> Self {
        Self {
            pool,
            config,
            changes,
        }
    }

    fn dispatch(&self) -> DispatchService {
        DispatchService::new(self.pool.clone(), self.config.dispatch.clone())
    }

    fn batches(&self) -> BatchService {
        BatchService::new(self.pool.clone(), self.config.dispatch.clone())
    }

    /// Asignar el ride más antiguo al conductor más cercano. Sin rides o
    /// conductores elegibles la respuesta es success con data null.
    pub async fn smart(
        &self,
        event_id: Uuid,
    ) -> Result<ApiResponse<Option<DispatchAssignment>>, AppError> {
        match self.dispatch().smart_dispatch(event_id).await? {
            Some(assignment) => {
                self.changes.publish(ChangeEvent::Updated {
                    entity: EntityKind::RideRequest,
                    id: assignment.ride_id,
                    event_id,
                });
                self.changes.publish(ChangeEvent::Updated {
                    entity: EntityKind::Driver,
                    id: assignment.driver_id,
                    event_id,
                });

                Ok(ApiResponse::success_with_message(
                    Some(assignment),
                    "Ride asignado".to_string(),
                ))
            }
            None => Ok(ApiResponse::success_with_message(
                None,
                "Sin asignación posible en este momento".to_string(),
            )),
        }
    }

    /// Barrido completo: smart dispatch en loop hasta agotar pares
    pub async fn dispatch_all(
        &self,
        event_id: Uuid,
    ) -> Result<ApiResponse<DispatchAllResponse>, AppError> {
        let assigned_count = self.dispatch().dispatch_all_rides(event_id).await?;

        Ok(ApiResponse::success_with_message(
            DispatchAllResponse { assigned_count },
            format!("{} rides asignados", assigned_count),
        ))
    }

    /// Batching por clusters: una pasada sobre los rides en espera
    pub async fn batch(
        &self,
        event_id: Uuid,
    ) -> Result<ApiResponse<BatchDispatchSummary>, AppError> {
        let summary = self.batches().batch_dispatch(event_id).await?;

        for batch_id in &summary.batch_ids {
            self.changes.publish(ChangeEvent::Inserted {
                entity: EntityKind::RideBatch,
                id: *batch_id,
                event_id,
            });
        }

        Ok(ApiResponse::success_with_message(
            summary,
            "Pasada de batch dispatch completada".to_string(),
        ))
    }

    /// El conductor marcó un pickup como hecho
    pub async fn mark_pickup(
        &self,
        request: MarkPickupRequest,
    ) -> Result<ApiResponse<PickupResult>, AppError> {
        let result = self.batches().mark_pickup_complete(request.batch_item_id).await?;
        let event_id = self.batch_event_id(result.item.batch_id).await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::RideBatchItem,
            id: result.item.id,
            event_id,
        });
        if result.batch_in_progress {
            self.changes.publish(ChangeEvent::Updated {
                entity: EntityKind::RideBatch,
                id: result.item.batch_id,
                event_id,
            });
        }

        Ok(ApiResponse::success_with_message(
            result,
            "Pickup registrado".to_string(),
        ))
    }

    /// El conductor terminó todos los drop-offs del batch
    pub async fn complete_batch(
        &self,
        request: CompleteBatchRequest,
    ) -> Result<ApiResponse<RideBatch>, AppError> {
        let batch = self.batches().complete_batch(request.batch_id).await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::RideBatch,
            id: batch.id,
            event_id: batch.event_id,
        });

        Ok(ApiResponse::success_with_message(
            batch,
            "Batch completado".to_string(),
        ))
    }

    async fn batch_event_id(&self, batch_id: Uuid) -> Result<Uuid, AppError> {
        let batch = crate::repositories::BatchRepository::new(self.pool.clone())
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch '{}' not found", batch_id)))?;
        Ok(batch.event_id)
    }
}
