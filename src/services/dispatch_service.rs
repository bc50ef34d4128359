//! Dispatcher de rides individuales
//!
//! Empareja el ride en espera más antiguo con el conductor disponible
//! más cercano. Este camino usa la heurística sobre distancia en línea
//! recta directamente (nunca el proveedor externo): su presupuesto de
//! latencia es menor que el de update_ride_eta.

use crate::config::environment::DispatchConfig;
use crate::models::{Driver, RideRequest, RideStatus};
use crate::repositories::{DriverRepository, RideRepository};
use crate::services::eta_service::EtaService;
use crate::services::lifecycle_service::LifecycleService;
use crate::utils::errors::AppError;
use crate::utils::geo::distance_km;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Resultado de una asignación individual
#[derive(Debug, Clone, Serialize)]
pub struct DispatchAssignment {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub eta_minutes: i32,
}

/// Conductor más cercano a un punto de pickup. Empates: gana el primero
/// encontrado en el orden de la lista (no determinístico entre corridas).
pub fn nearest_driver<'a>(drivers: &'a [Driver], lat: f64, lng: f64) -> Option<&'a Driver> {
    let mut best: Option<(&Driver, f64)> = None;

    for driver in drivers {
        let Some((dlat, dlng)) = driver.position() else {
            continue;
        };
        let d = distance_km(lat, lng, dlat, dlng);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((driver, d)),
        }
    }

    best.map(|(driver, _)| driver)
}

/// Plan puro de asignaciones: recorre los rides en el orden dado (más
/// viejo primero) y empareja cada uno con el conductor libre más cercano,
/// consumiéndolo del pool. Termina cuando se agota cualquiera de los dos
/// conjuntos; cada conductor aparece a lo sumo una vez en el plan.
pub fn plan_assignments(
    waiting: &[RideRequest],
    drivers: &[Driver],
    eta_service: &EtaService,
) -> Vec<DispatchAssignment> {
    let mut free: Vec<Driver> = drivers.to_vec();
    let mut plan = Vec::new();

    for ride in waiting {
        let Some((driver_id, dlat, dlng)) = nearest_driver(&free, ride.pickup_lat, ride.pickup_lng)
            .and_then(|d| d.position().map(|(lat, lng)| (d.id, lat, lng)))
        else {
            // Sin conductores ubicados restantes
            break;
        };

        let eta = eta_service
            .heuristic_eta_minutes(distance_km(ride.pickup_lat, ride.pickup_lng, dlat, dlng));

        free.retain(|d| d.id != driver_id);
        plan.push(DispatchAssignment {
            ride_id: ride.id,
            driver_id,
            eta_minutes: eta,
        });
    }

    plan
}

pub struct DispatchService {
    pool: PgPool,
    config: DispatchConfig,
}

impl DispatchService {
    pub fn new(pool: PgPool, config: DispatchConfig) -> Self {
        Self { pool, config }
    }

    fn rides(&self) -> RideRepository {
        RideRepository::new(self.pool.clone())
    }

    fn drivers(&self) -> DriverRepository {
        DriverRepository::new(self.pool.clone())
    }

    fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.pool.clone(), self.config.clone())
    }

    /// Conductor disponible más cercano a un pickup dentro de un evento
    pub async fn find_nearest_driver(
        &self,
        event_id: Uuid,
        pickup_lat: f64,
        pickup_lng: f64,
    ) -> Result<Option<Driver>, AppError> {
        let candidates = self.drivers().find_available(event_id).await?;
        Ok(nearest_driver(&candidates, pickup_lat, pickup_lng).cloned())
    }

    /// Asignar el ride en espera más antiguo al conductor más cercano.
    /// No-op (Ok(None)) si no hay rides en espera o conductores libres,
    /// o si se pierde la carrera contra otro dispatch concurrente.
    pub async fn smart_dispatch(&self, event_id: Uuid) -> Result<Option<DispatchAssignment>, AppError> {
        let Some(ride) = self.rides().find_oldest_waiting(event_id).await? else {
            return Ok(None);
        };

        let Some(driver) = self
            .find_nearest_driver(event_id, ride.pickup_lat, ride.pickup_lng)
            .await?
        else {
            return Ok(None);
        };

        // Heurística directa sobre línea recta, sin proveedor externo
        let (dlat, dlng) = driver.position().ok_or_else(|| {
            AppError::Internal("Available driver without coordinates".to_string())
        })?;
        let eta_service = EtaService::new(self.config.clone(), None);
        let eta = eta_service
            .heuristic_eta_minutes(distance_km(ride.pickup_lat, ride.pickup_lng, dlat, dlng));

        // Claim condicional: solo gana si el conductor sigue disponible
        if !self.drivers().claim_for_assignment(driver.id).await? {
            log::debug!("🏁 Lost driver claim race for {}", driver.id);
            return Ok(None);
        }

        match self
            .lifecycle()
            .transition(ride.id, RideStatus::Assigned, Some(driver.id))
            .await
        {
            Ok(_) => {}
            Err(AppError::InvalidTransition(_)) | Err(AppError::Conflict(_)) => {
                // El ride cambió de estado por debajo; devolver el claim
                self.drivers().release(driver.id).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        self.rides().update_driver_eta(ride.id, eta).await?;

        log::info!(
            "🚕 Dispatched ride {} to driver {} (ETA {} min)",
            ride.id,
            driver.id,
            eta
        );

        Ok(Some(DispatchAssignment {
            ride_id: ride.id,
            driver_id: driver.id,
            eta_minutes: eta,
        }))
    }

    /// Asignar hasta vaciar la cola o los conductores: una foto de ambos
    /// conjuntos, un plan puro sobre ella y un claim condicional por par.
    /// Los pares que pierden la carrera contra otra mutación concurrente
    /// se saltean sin abortar el resto.
    pub async fn dispatch_all_rides(&self, event_id: Uuid) -> Result<u32, AppError> {
        let waiting = self.rides().find_by_status(event_id, RideStatus::Waiting).await?;
        let drivers = self.drivers().find_available(event_id).await?;
        let eta_service = EtaService::new(self.config.clone(), None);
        let plan = plan_assignments(&waiting, &drivers, &eta_service);

        let mut assigned = 0u32;
        for planned in plan.into_iter().take(self.config.dispatch_loop_cap as usize) {
            if !self.drivers().claim_for_assignment(planned.driver_id).await? {
                log::debug!("🏁 Lost driver claim race for {}", planned.driver_id);
                continue;
            }

            match self
                .lifecycle()
                .transition(planned.ride_id, RideStatus::Assigned, Some(planned.driver_id))
                .await
            {
                Ok(_) => {}
                Err(AppError::InvalidTransition(_)) | Err(AppError::Conflict(_)) => {
                    self.drivers().release(planned.driver_id).await?;
                    continue;
                }
                Err(e) => return Err(e),
            }

            self.rides()
                .update_driver_eta(planned.ride_id, planned.eta_minutes)
                .await?;
            assigned += 1;
        }

        log::info!("📋 dispatch_all assigned {} rides for event {}", assigned, event_id);
        Ok(assigned)
    }

    /// Recalcular la ETA del conductor de un ride ya asignado, usando el
    /// estimador completo (proveedor externo primero).
    pub async fn update_ride_eta(
        &self,
        eta_service: &EtaService,
        ride_id: Uuid,
    ) -> Result<i32, AppError> {
        let ride = self
            .rides()
            .find_by_id(ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride '{}' not found", ride_id)))?;

        let driver_id = ride.assigned_driver_id.ok_or_else(|| {
            AppError::BadRequest("Ride has no assigned driver".to_string())
        })?;

        let driver = self
            .drivers()
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver '{}' not found", driver_id)))?;

        let origin = driver.position().ok_or_else(|| {
            AppError::BadRequest("Driver has not reported a location yet".to_string())
        })?;

        let eta = eta_service
            .calculate_eta(origin, (ride.pickup_lat, ride.pickup_lng))
            .await;
        self.rides().update_driver_eta(ride_id, eta).await?;

        Ok(eta)
    }
}

/// Helper puro para estimar la espera de un ride según su posición en la
/// cola: la espera base más una duración de viaje por cada ride adelante.
/// Sin histórico de viajes, ambas constantes salen de la config.
pub fn estimated_wait_for_position(position: i64, config: &DispatchConfig) -> i32 {
    let ahead = position.max(1) - 1;
    (config.fallback_wait_minutes + ahead * config.fallback_duration_minutes) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::DriverStatus;

    fn driver_at(lat: f64, lng: f64) -> Driver {
        Driver {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            driver_name: "test".to_string(),
            is_online: true,
            status: DriverStatus::Available,
            current_lat: Some(lat),
            current_lng: Some(lng),
            max_capacity: 4,
            current_passenger_load: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_nearest_driver_picks_minimum_distance() {
        let far = driver_at(41.0, -74.0);
        let near = driver_at(40.01, -74.0);
        let drivers = vec![far.clone(), near.clone()];

        let chosen = nearest_driver(&drivers, 40.0, -74.0).unwrap();
        assert_eq!(chosen.id, near.id);
    }

    #[test]
    fn test_nearest_driver_empty_set() {
        assert!(nearest_driver(&[], 40.0, -74.0).is_none());
    }

    #[test]
    fn test_nearest_driver_skips_unlocated() {
        let mut unlocated = driver_at(40.0, -74.0);
        unlocated.current_lat = None;
        unlocated.current_lng = None;
        let located = driver_at(40.5, -74.0);
        let drivers = vec![unlocated, located.clone()];

        let chosen = nearest_driver(&drivers, 40.0, -74.0).unwrap();
        assert_eq!(chosen.id, located.id);
    }

    #[test]
    fn test_nearest_driver_tie_takes_first() {
        let a = driver_at(40.01, -74.0);
        let b = driver_at(40.01, -74.0);
        let drivers = vec![a.clone(), b];

        let chosen = nearest_driver(&drivers, 40.0, -74.0).unwrap();
        assert_eq!(chosen.id, a.id);
    }

    fn waiting_ride(lat: f64, lng: f64) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            rider_name: "test".to_string(),
            pickup_address: "somewhere".to_string(),
            pickup_lat: lat,
            pickup_lng: lng,
            passenger_count: 1,
            status: RideStatus::Waiting,
            assigned_driver_id: None,
            batch_id: None,
            batch_sequence: None,
            estimated_wait_minutes: None,
            driver_eta_minutes: None,
            arrival_timestamp: None,
            arrival_deadline: None,
            completion_timestamp: None,
            rider_confirmed: false,
            rider_hash: None,
            created_at: Utc::now(),
        }
    }

    fn eta() -> EtaService {
        EtaService::new(DispatchConfig::default(), None)
    }

    #[test]
    fn test_plan_assigns_min_of_rides_and_drivers() {
        let rides = vec![
            waiting_ride(40.0, -74.0),
            waiting_ride(40.1, -74.0),
            waiting_ride(40.2, -74.0),
        ];

        // Más rides que conductores: se asigna uno por conductor
        let two_drivers = vec![driver_at(40.0, -74.0), driver_at(40.1, -74.0)];
        assert_eq!(plan_assignments(&rides, &two_drivers, &eta()).len(), 2);

        // Más conductores que rides: se asigna uno por ride
        let four_drivers = vec![
            driver_at(40.0, -74.0),
            driver_at(40.1, -74.0),
            driver_at(40.2, -74.0),
            driver_at(40.3, -74.0),
        ];
        assert_eq!(plan_assignments(&rides, &four_drivers, &eta()).len(), 3);
    }

    #[test]
    fn test_plan_uses_each_driver_once() {
        let rides = vec![waiting_ride(40.0, -74.0), waiting_ride(40.001, -74.0)];
        let drivers = vec![driver_at(40.0, -74.0), driver_at(40.5, -74.0)];

        let plan = plan_assignments(&rides, &drivers, &eta());
        assert_eq!(plan.len(), 2);
        assert_ne!(plan[0].driver_id, plan[1].driver_id);
    }

    #[test]
    fn test_plan_serves_queue_in_order() {
        // Con un solo conductor, gana el primero de la cola
        let rides = vec![waiting_ride(40.2, -74.0), waiting_ride(40.0, -74.0)];
        let drivers = vec![driver_at(40.0, -74.0)];

        let plan = plan_assignments(&rides, &drivers, &eta());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].ride_id, rides[0].id);
    }

    #[test]
    fn test_plan_second_pass_assigns_nothing() {
        let rides = vec![
            waiting_ride(40.0, -74.0),
            waiting_ride(40.1, -74.0),
            waiting_ride(40.2, -74.0),
        ];
        let drivers = vec![driver_at(40.0, -74.0), driver_at(40.1, -74.0)];

        let plan = plan_assignments(&rides, &drivers, &eta());
        assert_eq!(plan.len(), 2);

        // Aplicar el plan y volver a planificar sobre lo que queda
        let leftover_rides: Vec<RideRequest> = rides
            .iter()
            .filter(|r| !plan.iter().any(|p| p.ride_id == r.id))
            .cloned()
            .collect();
        let leftover_drivers: Vec<Driver> = drivers
            .iter()
            .filter(|d| !plan.iter().any(|p| p.driver_id == d.id))
            .cloned()
            .collect();

        assert_eq!(leftover_rides.len(), 1);
        assert!(leftover_drivers.is_empty());
        assert!(plan_assignments(&leftover_rides, &leftover_drivers, &eta()).is_empty());
    }

    #[test]
    fn test_plan_ignores_unlocated_drivers() {
        let mut unlocated = driver_at(40.0, -74.0);
        unlocated.current_lat = None;
        unlocated.current_lng = None;
        let located = driver_at(40.0, -74.0);

        let rides = vec![waiting_ride(40.0, -74.0), waiting_ride(40.1, -74.0)];
        let plan = plan_assignments(&rides, &[unlocated, located.clone()], &eta());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].driver_id, located.id);
    }

    #[test]
    fn test_plan_empty_inputs() {
        let drivers = vec![driver_at(40.0, -74.0)];
        assert!(plan_assignments(&[], &drivers, &eta()).is_empty());
        assert!(plan_assignments(&[waiting_ride(40.0, -74.0)], &[], &eta()).is_empty());
    }

    #[test]
    fn test_estimated_wait_scales_with_position() {
        let config = DispatchConfig::default();
        assert_eq!(estimated_wait_for_position(1, &config), 15);
        // Cada ride adelante suma una duración de viaje estimada
        assert_eq!(estimated_wait_for_position(3, &config), 35);
        // Posiciones degeneradas quedan en el piso
        assert_eq!(estimated_wait_for_position(0, &config), 15);
    }
}
