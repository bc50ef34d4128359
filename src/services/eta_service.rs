//! Estimador de ETA
//!
//! Intenta el proveedor externo de routing (Mapbox Directions) y ante
//! cualquier falla o ausencia de token cae a la heurística de velocidad
//! promedio. El error del proveedor nunca llega al caller.

use crate::config::environment::DispatchConfig;
use crate::utils::errors::AppError;
use crate::utils::geo::distance_km;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Resultado de una consulta de routing externa
#[derive(Debug, Clone, Copy)]
pub struct RouteEstimate {
    pub duration_seconds: f64,
    pub distance_meters: f64,
}

/// Proveedor externo de distancias de ruta. Seam para test doubles.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<RouteEstimate, AppError>;
}

#[derive(Debug, Deserialize)]
struct MapboxDirectionsResponse {
    routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    duration: f64,
    distance: f64,
}

/// Cliente de Mapbox Directions con timeout acotado
pub struct MapboxRoutingProvider {
    token: String,
    client: reqwest::Client,
}

impl MapboxRoutingProvider {
    pub fn new(token: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { token, client }
    }
}

#[async_trait]
impl RoutingProvider for MapboxRoutingProvider {
    async fn route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<RouteEstimate, AppError> {
        // Mapbox espera lng,lat
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving/{},{};{},{}?access_token={}&overview=false",
            origin.1, origin.0, destination.1, destination.0, self.token
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Directions request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Directions request failed with status {}",
                response.status()
            )));
        }

        let body: MapboxDirectionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid directions response: {}", e)))?;

        let route = body.routes.first().ok_or_else(|| {
            AppError::ExternalApi("Directions response contained no routes".to_string())
        })?;

        Ok(RouteEstimate {
            duration_seconds: route.duration,
            distance_meters: route.distance,
        })
    }
}

pub struct EtaService {
    provider: Option<Arc<dyn RoutingProvider>>,
    config: DispatchConfig,
}

impl EtaService {
    pub fn new(config: DispatchConfig, mapbox_token: Option<String>) -> Self {
        let provider: Option<Arc<dyn RoutingProvider>> = mapbox_token.map(|token| {
            Arc::new(MapboxRoutingProvider::new(token, config.routing_timeout_secs))
                as Arc<dyn RoutingProvider>
        });

        Self { provider, config }
    }

    /// Construcción con un proveedor arbitrario (tests)
    pub fn with_provider(config: DispatchConfig, provider: Arc<dyn RoutingProvider>) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// Heurística pura: distancia / velocidad promedio, con buffer de
    /// tráfico, acotada a [min, max] minutos.
    pub fn heuristic_eta_minutes(&self, distance_km: f64) -> i32 {
        let raw = (distance_km / self.config.average_speed_kmh * 60.0 * self.config.traffic_buffer)
            .ceil() as i32;
        raw.clamp(self.config.min_eta_minutes, self.config.max_eta_minutes)
    }

    /// ETA entre dos puntos: proveedor externo primero, heurística como
    /// fallback. Nunca devuelve error.
    pub async fn calculate_eta(&self, origin: (f64, f64), destination: (f64, f64)) -> i32 {
        if let Some(provider) = &self.provider {
            match provider.route(origin, destination).await {
                Ok(estimate) => {
                    let minutes = (estimate.duration_seconds / 60.0).ceil() as i32;
                    return minutes.max(1);
                }
                Err(e) => {
                    log::warn!("⚠️ Routing provider unavailable, using heuristic: {}", e);
                }
            }
        }

        let d = distance_km(origin.0, origin.1, destination.0, destination.1);
        self.heuristic_eta_minutes(d)
    }

    /// ETAs acumuladas de un viaje multi-parada: cada tramo se calcula
    /// desde la parada anterior, no desde la posición original del
    /// conductor. El resultado es monótonamente no decreciente.
    pub fn calculate_batch_etas(&self, driver: (f64, f64), stops: &[(f64, f64)]) -> Vec<i32> {
        let mut etas = Vec::with_capacity(stops.len());
        let mut current = driver;
        let mut cumulative = 0;

        for stop in stops {
            let leg_km = distance_km(current.0, current.1, stop.0, stop.1);
            cumulative += self.heuristic_eta_minutes(leg_km);
            etas.push(cumulative);
            current = *stop;
        }

        etas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EtaService {
        EtaService::new(DispatchConfig::default(), None)
    }

    #[test]
    fn test_heuristic_minimum_clamp() {
        // Una cuadra de distancia no baja de 2 minutos
        assert_eq!(service().heuristic_eta_minutes(0.1), 2);
        assert_eq!(service().heuristic_eta_minutes(0.0), 2);
    }

    #[test]
    fn test_heuristic_maximum_clamp() {
        // 500 km quedan acotados a 60 minutos
        assert_eq!(service().heuristic_eta_minutes(500.0), 60);
    }

    #[test]
    fn test_heuristic_midrange_value() {
        // 10 km a 30 km/h con buffer 1.2 = 24 minutos
        assert_eq!(service().heuristic_eta_minutes(10.0), 24);
    }

    #[tokio::test]
    async fn test_calculate_eta_falls_back_without_provider() {
        let eta = service().calculate_eta((40.0, -74.0), (40.05, -74.0)).await;
        assert!(eta >= 2 && eta <= 60);
    }

    #[tokio::test]
    async fn test_calculate_eta_falls_back_on_provider_error() {
        struct FailingProvider;

        #[async_trait]
        impl RoutingProvider for FailingProvider {
            async fn route(
                &self,
                _origin: (f64, f64),
                _destination: (f64, f64),
            ) -> Result<RouteEstimate, AppError> {
                Err(AppError::ExternalApi("timeout".to_string()))
            }
        }

        let service =
            EtaService::with_provider(DispatchConfig::default(), Arc::new(FailingProvider));
        let eta = service.calculate_eta((40.0, -74.0), (40.05, -74.0)).await;
        assert!(eta >= 2 && eta <= 60);
    }

    #[tokio::test]
    async fn test_calculate_eta_prefers_provider() {
        struct FixedProvider;

        #[async_trait]
        impl RoutingProvider for FixedProvider {
            async fn route(
                &self,
                _origin: (f64, f64),
                _destination: (f64, f64),
            ) -> Result<RouteEstimate, AppError> {
                Ok(RouteEstimate {
                    duration_seconds: 300.0,
                    distance_meters: 2000.0,
                })
            }
        }

        let service =
            EtaService::with_provider(DispatchConfig::default(), Arc::new(FixedProvider));
        let eta = service.calculate_eta((40.0, -74.0), (40.05, -74.0)).await;
        assert_eq!(eta, 5);
    }

    #[test]
    fn test_batch_etas_monotonic() {
        let stops = [(40.01, -74.0), (40.02, -74.0), (40.03, -74.0)];
        let etas = service().calculate_batch_etas((40.0, -74.0), &stops);
        assert_eq!(etas.len(), 3);
        for pair in etas.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_batch_etas_empty_stops() {
        let etas = service().calculate_batch_etas((40.0, -74.0), &[]);
        assert!(etas.is_empty());
    }
}
