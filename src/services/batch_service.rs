//! Clustering y dispatcher de batches
//!
//! Agrupa rides en espera por celda geográfica, asigna cada cluster al
//! conductor con capacidad más cercano y arma la ruta multi-parada con
//! la heurística nearest-neighbor. La creación del batch (batch + items
//! + rides + conductor) corre en una sola transacción.

use crate::config::environment::DispatchConfig;
use crate::models::{BatchStatus, Driver, RideBatch, RideBatchItem, RideRequest, RideStatus};
use crate::repositories::{BatchRepository, DriverRepository, RideRepository};
use crate::services::dispatch_service::nearest_driver;
use crate::services::eta_service::EtaService;
use crate::services::lifecycle_service::LifecycleService;
use crate::utils::errors::AppError;
use crate::utils::geo::{cluster_key, distance_km};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Un grupo de rides en espera cuyos pickups caen en la misma celda
#[derive(Debug, Clone, Serialize)]
pub struct RideCluster {
    pub key: String,
    pub rides: Vec<RideRequest>,
    pub total_passengers: i32,
    pub oldest_created_at: DateTime<Utc>,
    pub avg_lat: f64,
    pub avg_lng: f64,
}

/// Agrupar rides por clave de celda. Los miembros quedan en orden de
/// creación (el input ya viene así) y el centro del cluster se mantiene
/// como promedio incremental: new_avg = (old_avg*(n-1) + v) / n.
/// Los clusters salen ordenados por miembro más antiguo (se sirve primero
/// al cluster que más espera).
pub fn cluster_waiting(rides: &[RideRequest]) -> Vec<RideCluster> {
    let mut clusters: Vec<RideCluster> = Vec::new();

    for ride in rides {
        let key = cluster_key(ride.pickup_lat, ride.pickup_lng);

        match clusters.iter_mut().find(|c| c.key == key) {
            Some(cluster) => {
                let n = (cluster.rides.len() + 1) as f64;
                cluster.avg_lat = (cluster.avg_lat * (n - 1.0) + ride.pickup_lat) / n;
                cluster.avg_lng = (cluster.avg_lng * (n - 1.0) + ride.pickup_lng) / n;
                cluster.total_passengers += ride.passenger_count;
                if ride.created_at < cluster.oldest_created_at {
                    cluster.oldest_created_at = ride.created_at;
                }
                cluster.rides.push(ride.clone());
            }
            None => clusters.push(RideCluster {
                key,
                total_passengers: ride.passenger_count,
                oldest_created_at: ride.created_at,
                avg_lat: ride.pickup_lat,
                avg_lng: ride.pickup_lng,
                rides: vec![ride.clone()],
            }),
        }
    }

    clusters.sort_by_key(|c| c.oldest_created_at);
    clusters
}

/// Selección greedy de miembros de un cluster dentro de la capacidad
/// libre: recorre en orden de creación y agrega cada ride que todavía
/// entre en la suma de pasajeros.
pub fn greedy_fit<'a>(rides: &'a [RideRequest], available_capacity: i32) -> Vec<&'a RideRequest> {
    let mut selected = Vec::new();
    let mut sum = 0;

    for ride in rides {
        if sum + ride.passenger_count <= available_capacity {
            sum += ride.passenger_count;
            selected.push(ride);
        }
    }

    selected
}

/// Una parada planificada de la ruta de pickup
#[derive(Debug, Clone)]
pub struct PlannedStop {
    pub ride_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub order_index: i32,
    pub cumulative_eta_minutes: i32,
}

/// Orden de pickup por nearest-neighbor: desde la posición del conductor,
/// elegir repetidamente el pickup no visitado más cercano a la posición
/// "actual" (el último visitado), acumulando la ETA de cada tramo.
/// No es TSP-óptimo a propósito.
pub fn plan_pickup_order(
    start: (f64, f64),
    stops: &[(Uuid, f64, f64)],
    eta_service: &EtaService,
) -> Vec<PlannedStop> {
    let mut remaining: Vec<(Uuid, f64, f64)> = stops.to_vec();
    let mut planned = Vec::with_capacity(stops.len());
    let mut current = start;
    let mut cumulative = 0;
    let mut order_index = 0;

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_d = f64::MAX;
        for (idx, (_, lat, lng)) in remaining.iter().enumerate() {
            let d = distance_km(current.0, current.1, *lat, *lng);
            if d < best_d {
                best_d = d;
                best_idx = idx;
            }
        }

        let (ride_id, lat, lng) = remaining.remove(best_idx);
        cumulative += eta_service.heuristic_eta_minutes(best_d);
        planned.push(PlannedStop {
            ride_id,
            lat,
            lng,
            order_index,
            cumulative_eta_minutes: cumulative,
        });
        current = (lat, lng);
        order_index += 1;
    }

    planned
}

/// Resumen de una pasada de batch dispatch
#[derive(Debug, Clone, Serialize)]
pub struct BatchDispatchSummary {
    pub clusters_considered: usize,
    pub batches_created: usize,
    pub rides_batched: usize,
    pub batch_ids: Vec<Uuid>,
}

/// Resultado de marcar un pickup
#[derive(Debug, Clone, Serialize)]
pub struct PickupResult {
    pub item: RideBatchItem,
    pub batch_in_progress: bool,
}

pub struct BatchService {
    pool: PgPool,
    config: DispatchConfig,
}

impl BatchService {
    pub fn new(pool: PgPool, config: DispatchConfig) -> Self {
        Self { pool, config }
    }

    fn rides(&self) -> RideRepository {
        RideRepository::new(self.pool.clone())
    }

    fn drivers(&self) -> DriverRepository {
        DriverRepository::new(self.pool.clone())
    }

    fn batches(&self) -> BatchRepository {
        BatchRepository::new(self.pool.clone())
    }

    fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.pool.clone(), self.config.clone())
    }

    fn eta(&self) -> EtaService {
        EtaService::new(self.config.clone(), None)
    }

    /// Clusters de rides en espera sin batch, ordenados por antigüedad
    pub async fn cluster_waiting_rides(&self, event_id: Uuid) -> Result<Vec<RideCluster>, AppError> {
        let rides = self.rides().find_waiting_unbatched(event_id).await?;
        Ok(cluster_waiting(&rides))
    }

    /// Una pasada sobre todos los clusters (no itera hasta convergencia):
    /// cada cluster se procesa una vez; los que no consiguen conductor
    /// quedan en espera para una pasada futura o dispatch individual.
    pub async fn batch_dispatch(&self, event_id: Uuid) -> Result<BatchDispatchSummary, AppError> {
        let clusters = self.cluster_waiting_rides(event_id).await?;
        let mut summary = BatchDispatchSummary {
            clusters_considered: clusters.len(),
            batches_created: 0,
            rides_batched: 0,
            batch_ids: Vec::new(),
        };

        for cluster in &clusters {
            // Alcanza con que el miembro más chico entre en algún vehículo
            let required = cluster
                .rides
                .iter()
                .map(|r| r.passenger_count)
                .min()
                .unwrap_or(1);

            let candidates = self.drivers().find_with_capacity(event_id, required).await?;
            let Some(driver) = nearest_driver(&candidates, cluster.avg_lat, cluster.avg_lng) else {
                log::debug!("🚫 No driver with capacity for cluster {}", cluster.key);
                continue;
            };

            let fitting = greedy_fit(&cluster.rides, driver.available_capacity());
            if fitting.is_empty() {
                continue;
            }

            let ride_ids: Vec<Uuid> = fitting.iter().map(|r| r.id).collect();
            match self.create_batch(event_id, driver.id, &ride_ids).await {
                Ok(batch) => {
                    summary.batches_created += 1;
                    summary.rides_batched += ride_ids.len();
                    summary.batch_ids.push(batch.id);
                    log::info!(
                        "📦 Batch {} created for cluster {} ({} rides, {} passengers)",
                        batch.id,
                        cluster.key,
                        ride_ids.len(),
                        batch.total_passengers
                    );
                }
                // Carreras y desbordes dejan el cluster para otra pasada
                Err(AppError::Conflict(msg)) | Err(AppError::CapacityExceeded(msg)) => {
                    log::warn!("⚠️ Skipping cluster {}: {}", cluster.key, msg);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Crear un batch con su ruta de pickup ordenada. Batch, items, rides
    /// y conductor se escriben en una sola transacción: si algo falla no
    /// queda ningún batch huérfano.
    pub async fn create_batch(
        &self,
        event_id: Uuid,
        driver_id: Uuid,
        ride_ids: &[Uuid],
    ) -> Result<RideBatch, AppError> {
        if ride_ids.is_empty() {
            return Err(AppError::BadRequest("A batch needs at least one ride".to_string()));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Error starting transaction: {}", e)))?;

        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(driver_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error loading driver: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Driver '{}' not found", driver_id)))?;

        if !driver.is_online || driver.status != crate::models::DriverStatus::Available {
            return Err(AppError::Conflict(format!(
                "Driver '{}' is no longer available",
                driver_id
            )));
        }
        let driver_pos = driver.position().ok_or_else(|| {
            AppError::Conflict(format!("Driver '{}' has no known location", driver_id))
        })?;

        let rides = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE id = ANY($1) AND event_id = $2 AND status = 'waiting' AND batch_id IS NULL
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(ride_ids)
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error loading rides: {}", e)))?;

        if rides.len() != ride_ids.len() {
            return Err(AppError::Conflict(
                "One or more rides are no longer waiting".to_string(),
            ));
        }

        let total_passengers: i32 = rides.iter().map(|r| r.passenger_count).sum();
        if total_passengers > driver.available_capacity() {
            // Rechazar antes de escribir nada
            return Err(AppError::CapacityExceeded(format!(
                "Batch needs {} seats but driver '{}' has {}",
                total_passengers,
                driver_id,
                driver.available_capacity()
            )));
        }

        let batch_id = Uuid::new_v4();
        let now = Utc::now();
        let batch = sqlx::query_as::<_, RideBatch>(
            r#"
            INSERT INTO ride_batches (id, event_id, driver_id, status, total_passengers, created_at)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING *
            "#,
        )
        .bind(batch_id)
        .bind(event_id)
        .bind(driver_id)
        .bind(total_passengers)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error inserting batch: {}", e)))?;

        // Ruta nearest-neighbor desde la posición actual del conductor
        let stops: Vec<(Uuid, f64, f64)> = rides
            .iter()
            .map(|r| (r.id, r.pickup_lat, r.pickup_lng))
            .collect();
        let planned = plan_pickup_order(driver_pos, &stops, &self.eta());

        for stop in &planned {
            let estimated_arrival = now + Duration::minutes(stop.cumulative_eta_minutes as i64);
            sqlx::query(
                r#"
                INSERT INTO ride_batch_items
                    (id, batch_id, ride_request_id, pickup_order_index, estimated_arrival_time, picked_up)
                VALUES ($1, $2, $3, $4, $5, FALSE)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(batch_id)
            .bind(stop.ride_id)
            .bind(stop.order_index)
            .bind(estimated_arrival)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error inserting batch item: {}", e)))?;

            let result = sqlx::query(
                r#"
                UPDATE ride_requests
                SET batch_id = $2, batch_sequence = $3, assigned_driver_id = $4,
                    status = 'assigned', driver_eta_minutes = $5
                WHERE id = $1 AND status = 'waiting'
                "#,
            )
            .bind(stop.ride_id)
            .bind(batch_id)
            .bind(stop.order_index)
            .bind(driver_id)
            .bind(stop.cumulative_eta_minutes)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Error updating batched ride: {}", e)))?;

            if result.rows_affected() == 0 {
                return Err(AppError::Conflict(format!(
                    "Ride '{}' was claimed concurrently",
                    stop.ride_id
                )));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE drivers SET status = 'assigned', current_passenger_load = $2
            WHERE id = $1 AND status = 'available'
            "#,
        )
        .bind(driver_id)
        .bind(total_passengers)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error assigning driver: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Driver '{}' was claimed concurrently",
                driver_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Error committing batch: {}", e)))?;

        Ok(batch)
    }

    /// Marcar un pickup como hecho. El ride pasa a in_progress (con
    /// confirmación implícita); si era el último pendiente el batch entra
    /// en fase de drop-off.
    pub async fn mark_pickup_complete(&self, item_id: Uuid) -> Result<PickupResult, AppError> {
        let item = self
            .batches()
            .find_item_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch item '{}' not found", item_id)))?;

        if item.picked_up {
            return Err(AppError::Conflict(format!(
                "Batch item '{}' was already picked up",
                item_id
            )));
        }

        let ride = self
            .rides()
            .find_by_id(item.ride_request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Ride '{}' not found", item.ride_request_id))
            })?;

        // Todo cambio de status pasa por la máquina de estados
        match ride.status {
            RideStatus::Assigned => {
                self.lifecycle()
                    .transition(ride.id, RideStatus::Arrived, None)
                    .await?;
                self.lifecycle()
                    .transition(ride.id, RideStatus::InProgress, None)
                    .await?;
            }
            RideStatus::Arrived => {
                self.lifecycle()
                    .transition(ride.id, RideStatus::InProgress, None)
                    .await?;
            }
            RideStatus::InProgress => {}
            other => {
                return Err(AppError::InvalidTransition(format!(
                    "Ride '{}' in status '{}' cannot be picked up",
                    ride.id, other
                )));
            }
        }

        let updated = sqlx::query_as::<_, RideBatchItem>(
            r#"
            UPDATE ride_batch_items SET picked_up = TRUE, picked_up_at = $2
            WHERE id = $1 AND picked_up = FALSE
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error marking pickup: {}", e)))?
        .ok_or_else(|| {
            AppError::Conflict(format!("Batch item '{}' was picked up concurrently", item_id))
        })?;

        let unpicked = self.batches().count_unpicked(item.batch_id).await?;
        let mut batch_in_progress = false;
        if unpicked == 0 {
            // Todos los pickups hechos: arranca la fase de drop-off
            let result = sqlx::query(
                "UPDATE ride_batches SET status = 'in_progress' WHERE id = $1 AND status = 'pending'",
            )
            .bind(item.batch_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error advancing batch: {}", e)))?;
            batch_in_progress = result.rows_affected() == 1;

            if batch_in_progress {
                log::info!("📦 Batch {} entered drop-off phase", item.batch_id);
            }
        }

        Ok(PickupResult {
            item: updated,
            batch_in_progress,
        })
    }

    /// Completar un batch: batch y rides en viaje a completed, miembros
    /// nunca recogidos a cancelled, conductor liberado. Una sola
    /// transacción; la capacidad del conductor se libera acá y solo acá.
    pub async fn complete_batch(&self, batch_id: Uuid) -> Result<RideBatch, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Error starting transaction: {}", e)))?;

        let batch = sqlx::query_as::<_, RideBatch>(
            "SELECT * FROM ride_batches WHERE id = $1 FOR UPDATE",
        )
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error loading batch: {}", e)))?
        .ok_or_else(|| AppError::NotFound(format!("Batch '{}' not found", batch_id)))?;

        if !matches!(batch.status, BatchStatus::Pending | BatchStatus::InProgress) {
            return Err(AppError::InvalidTransition(format!(
                "Batch '{}' in status '{}' cannot be completed",
                batch_id, batch.status
            )));
        }

        let completed = sqlx::query_as::<_, RideBatch>(
            "UPDATE ride_batches SET status = 'completed' WHERE id = $1 RETURNING *",
        )
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error completing batch: {}", e)))?;

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE ride_requests
            SET status = 'completed', completion_timestamp = $2, assigned_driver_id = NULL
            WHERE batch_id = $1 AND status = 'in_progress'
            "#,
        )
        .bind(batch_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error completing batch rides: {}", e)))?;

        // Miembros nunca recogidos: no hay arista hacia completed, así que
        // se cancelan y quedan fuera del conductor liberado
        let leftovers = sqlx::query(
            r#"
            UPDATE ride_requests
            SET status = 'cancelled', assigned_driver_id = NULL
            WHERE batch_id = $1 AND status IN ('assigned', 'arrived')
            "#,
        )
        .bind(batch_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error cancelling leftover rides: {}", e)))?;
        if leftovers.rows_affected() > 0 {
            log::warn!(
                "⚠️ Batch {} completed with {} rides never picked up, cancelled",
                batch_id,
                leftovers.rows_affected()
            );
        }

        sqlx::query(
            "UPDATE drivers SET status = 'available', current_passenger_load = 0 WHERE id = $1",
        )
        .bind(batch.driver_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Error releasing driver: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Error committing batch completion: {}", e)))?;

        log::info!("✅ Batch {} completed, driver {} released", batch_id, batch.driver_id);
        Ok(completed)
    }

    /// Posición de un rider dentro de su batch, si tiene
    pub async fn batch_position_for_ride(
        &self,
        ride_id: Uuid,
    ) -> Result<Option<(RideBatchItem, RideBatch, i64, i64)>, AppError> {
        let Some(item) = self.batches().find_item_for_ride(ride_id).await? else {
            return Ok(None);
        };

        let batch = self
            .batches()
            .find_by_id(item.batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch '{}' not found", item.batch_id)))?;

        let items = self.batches().find_items(item.batch_id).await?;
        let total = items.len() as i64;
        let picked = items.iter().filter(|i| i.picked_up).count() as i64;

        Ok(Some((item, batch, total, picked)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RideStatus;

    fn ride_at(lat: f64, lng: f64, passengers: i32, created_offset_secs: i64) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            rider_name: "test".to_string(),
            pickup_address: "somewhere".to_string(),
            pickup_lat: lat,
            pickup_lng: lng,
            passenger_count: passengers,
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
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
        }
    }

    fn eta_service() -> EtaService {
        EtaService::new(DispatchConfig::default(), None)
    }

    #[test]
    fn test_cluster_groups_nearby_pickups() {
        let rides = vec![
            ride_at(40.0001, -74.0001, 1, 0),
            ride_at(40.0004, -74.0003, 2, 1),
            ride_at(40.1, -74.0, 1, 2),
        ];

        let clusters = cluster_waiting(&rides);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].rides.len(), 2);
        assert_eq!(clusters[0].total_passengers, 3);
        assert_eq!(clusters[1].rides.len(), 1);
    }

    #[test]
    fn test_clusters_ordered_by_oldest_member() {
        // El cluster lejano tiene el ride más viejo y debe salir primero
        let rides = vec![
            ride_at(40.1, -74.0, 1, -100),
            ride_at(40.0, -74.0, 1, 0),
            ride_at(40.0002, -74.0002, 1, 10),
        ];

        let clusters = cluster_waiting(&rides);
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].oldest_created_at < clusters[1].oldest_created_at);
        assert_eq!(clusters[0].rides.len(), 1);
    }

    #[test]
    fn test_cluster_running_average() {
        let rides = vec![
            ride_at(40.0000, -74.0000, 1, 0),
            ride_at(40.0004, -74.0004, 1, 1),
        ];

        let clusters = cluster_waiting(&rides);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].avg_lat - 40.0002).abs() < 1e-9);
        assert!((clusters[0].avg_lng - (-74.0002)).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_fit_respects_capacity() {
        let rides = vec![
            ride_at(40.0, -74.0, 2, 0),
            ride_at(40.0, -74.0, 3, 1),
            ride_at(40.0, -74.0, 1, 2),
        ];

        // El de 3 no entra después del de 2; el de 1 sí
        let selected = greedy_fit(&rides, 4);
        let counts: Vec<i32> = selected.iter().map(|r| r.passenger_count).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_greedy_fit_empty_when_nothing_fits() {
        let rides = vec![ride_at(40.0, -74.0, 4, 0)];
        assert!(greedy_fit(&rides, 3).is_empty());
    }

    #[test]
    fn test_plan_pickup_order_nearest_first() {
        let near = Uuid::new_v4();
        let far = Uuid::new_v4();
        let stops = vec![(far, 40.05, -74.0), (near, 40.01, -74.0)];

        let planned = plan_pickup_order((40.0, -74.0), &stops, &eta_service());
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].ride_id, near);
        assert_eq!(planned[0].order_index, 0);
        assert_eq!(planned[1].ride_id, far);
        assert_eq!(planned[1].order_index, 1);
    }

    #[test]
    fn test_plan_pickup_order_contiguous_indices_and_monotonic_eta() {
        let stops: Vec<(Uuid, f64, f64)> = (0..5)
            .map(|i| (Uuid::new_v4(), 40.0 + i as f64 * 0.01, -74.0))
            .collect();

        let planned = plan_pickup_order((40.02, -74.0), &stops, &eta_service());
        let mut indices: Vec<i32> = planned.iter().map(|s| s.order_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);

        for pair in planned.windows(2) {
            assert!(pair[0].cumulative_eta_minutes <= pair[1].cumulative_eta_minutes);
        }
    }

    #[test]
    fn test_plan_pickup_order_empty() {
        assert!(plan_pickup_order((40.0, -74.0), &[], &eta_service()).is_empty());
    }

    #[test]
    fn test_unpicked_members_fall_back_to_cancelled() {
        // Al completar un batch, un miembro nunca recogido no puede pasar
        // directo a completed; la salida es la cancelación
        assert!(!RideStatus::Assigned.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Arrived.can_transition_to(RideStatus::Completed));
        assert!(RideStatus::Assigned.can_transition_to(RideStatus::Cancelled));
        assert!(RideStatus::Arrived.can_transition_to(RideStatus::Cancelled));
    }
}
