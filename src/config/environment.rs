//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y los parámetros
//! ajustables del motor de dispatch.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Token opcional del proveedor externo de routing (Mapbox Directions)
    pub mapbox_token: Option<String>,
    pub dispatch: DispatchConfig,
}

/// Parámetros del motor de dispatch.
///
/// Los defaults son los valores de referencia del sistema; cada uno puede
/// sobreescribirse por variable de entorno.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Velocidad urbana promedio para la heurística de ETA (km/h)
    pub average_speed_kmh: f64,
    /// Buffer de tráfico aplicado sobre la heurística
    pub traffic_buffer: f64,
    /// ETA mínima en minutos
    pub min_eta_minutes: i32,
    /// ETA máxima en minutos
    pub max_eta_minutes: i32,
    /// Ventana de llegada antes de marcar no-show (minutos)
    pub no_show_window_minutes: i64,
    /// Cantidad de no-shows que dispara un cooldown
    pub no_show_threshold: i32,
    /// Duración del cooldown (minutos)
    pub cooldown_minutes: i64,
    /// Espera estimada por posición en cola cuando no hay histórico (minutos)
    pub fallback_wait_minutes: i64,
    /// Duración estimada de un viaje cuando no hay histórico (minutos)
    pub fallback_duration_minutes: i64,
    /// Tope de iteraciones para dispatch_all_rides
    pub dispatch_loop_cap: u32,
    /// Timeout de la consulta al proveedor externo de routing (segundos)
    pub routing_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: env_or("DISPATCH_AVG_SPEED_KMH", 30.0),
            traffic_buffer: env_or("DISPATCH_TRAFFIC_BUFFER", 1.2),
            min_eta_minutes: env_or("DISPATCH_MIN_ETA_MINUTES", 2),
            max_eta_minutes: env_or("DISPATCH_MAX_ETA_MINUTES", 60),
            no_show_window_minutes: env_or("NO_SHOW_WINDOW_MINUTES", 3),
            no_show_threshold: env_or("NO_SHOW_THRESHOLD", 2),
            cooldown_minutes: env_or("COOLDOWN_MINUTES", 15),
            fallback_wait_minutes: env_or("FALLBACK_WAIT_MINUTES", 15),
            fallback_duration_minutes: env_or("FALLBACK_DURATION_MINUTES", 10),
            dispatch_loop_cap: env_or("DISPATCH_LOOP_CAP", 500),
            routing_timeout_secs: env_or("ROUTING_TIMEOUT_SECS", 10),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env_or("PORT", 3000u16),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            mapbox_token: env::var("MAPBOX_TOKEN").ok(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_defaults_match_reference_values() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.average_speed_kmh, 30.0);
        assert_eq!(cfg.traffic_buffer, 1.2);
        assert_eq!(cfg.min_eta_minutes, 2);
        assert_eq!(cfg.max_eta_minutes, 60);
        assert_eq!(cfg.no_show_window_minutes, 3);
        assert_eq!(cfg.no_show_threshold, 2);
        assert_eq!(cfg.cooldown_minutes, 15);
    }
}
