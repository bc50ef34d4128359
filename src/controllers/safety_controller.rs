//! Controlador del motor de seguridad
//!
//! No-shows, cooldowns, consentimientos y emergencias. Los identificadores
//! de rider nunca viajan en claro: todo pasa por el hash pseudónimo.

use crate::config::environment::EnvironmentConfig;
use crate::dto::response::ApiResponse;
use crate::dto::ride_dto::RideResponse;
use crate::dto::safety_dto::{ConsentRequest, CooldownQuery, EmergencyRequest, NoShowRequest};
use crate::models::{EmergencyEvent, RiderConsent};
use crate::services::change_feed::{ChangeEvent, ChangeFeed, EntityKind};
use crate::services::safety_service::{CooldownStatus, SafetyService};
use crate::utils::errors::AppError;
use crate::utils::validation::rider_hash;
use sqlx::PgPool;
use validator::Validate;

pub struct SafetyController {
    pool: PgPool,
    config: EnvironmentConfig,
    changes: ChangeFeed,
}

impl SafetyController {
    pub fn new(pool: PgPool, config: EnvironmentConfig, changes: ChangeFeed) -> Self {
        Self {
            pool,
            config,
            changes,
        }
    }

    fn safety(&self) -> SafetyService {
        SafetyService::new(self.pool.clone(), self.config.dispatch.clone())
    }

    /// Rides con deadline de llegada vencido y sin confirmación. Pensado
    /// para el trigger periódico que decide qué no-shows procesar.
    pub async fn expired_no_shows(&self) -> Result<Vec<RideResponse>, AppError> {
        let rides = self.safety().get_expired_no_show_rides().await?;
        Ok(rides.into_iter().map(RideResponse::from).collect())
    }

    pub async fn process_no_show(
        &self,
        request: NoShowRequest,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        let updated = self.safety().process_no_show(request.ride_id).await?;

        self.changes.publish(ChangeEvent::Updated {
            entity: EntityKind::RideRequest,
            id: updated.id,
            event_id: updated.event_id,
        });

        Ok(ApiResponse::success_with_message(
            RideResponse::from(updated),
            "No-show procesado".to_string(),
        ))
    }

    pub async fn cooldown_status(
        &self,
        query: CooldownQuery,
    ) -> Result<CooldownStatus, AppError> {
        query.validate()?;

        let hash = rider_hash(query.event_id, &query.rider_name, &query.origin);
        self.safety().get_cooldown_status(query.event_id, &hash).await
    }

    pub async fn record_consent(
        &self,
        request: ConsentRequest,
    ) -> Result<ApiResponse<RiderConsent>, AppError> {
        request.validate()?;

        let hash = rider_hash(request.event_id, &request.rider_name, &request.origin);
        let consent = self.safety().record_consent(request.event_id, &hash).await?;

        Ok(ApiResponse::success_with_message(
            consent,
            "Consentimiento registrado".to_string(),
        ))
    }

    pub async fn trigger_emergency(
        &self,
        request: EmergencyRequest,
    ) -> Result<ApiResponse<EmergencyEvent>, AppError> {
        request.validate()?;

        // Hash solo si vienen ambos componentes; una emergencia anónima
        // también se registra
        let hash = match (&request.rider_name, &request.origin) {
            (Some(name), Some(origin)) => Some(rider_hash(request.event_id, name, origin)),
            _ => None,
        };

        let emergency = self
            .safety()
            .trigger_emergency(
                request.event_id,
                request.ride_request_id,
                hash,
                request.details,
            )
            .await?;

        self.changes.publish(ChangeEvent::Inserted {
            entity: EntityKind::EmergencyEvent,
            id: emergency.id,
            event_id: emergency.event_id,
        });

        Ok(ApiResponse::success_with_message(
            emergency,
            "Emergencia registrada".to_string(),
        ))
    }
}
