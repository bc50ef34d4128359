//! Utilidades geográficas
//!
//! Distancia de círculo máximo (haversine) y la clave de clustering
//! basada en una grilla de ~500 metros. Funciones puras, sin estado.

/// Radio de la Tierra en kilómetros
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Factor de escala de la grilla de clustering: 1/200° ≈ 555 m
const CLUSTER_GRID_SCALE: f64 = 200.0;

/// Distancia haversine en kilómetros entre dos puntos (lat/lng en grados).
/// Simétrica respecto al orden de los puntos.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlng = (dlng * 0.5).sin();
    let h = sin_dlat * sin_dlat + phi1.cos() * phi2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Clave determinística de celda para agrupar pickups cercanos.
/// Dos puntos dentro de la misma celda de ~500 m comparten la clave;
/// el efecto de borde entre celdas adyacentes es un edge-case aceptado.
pub fn cluster_key(lat: f64, lng: f64) -> String {
    let lat_cell = (lat * CLUSTER_GRID_SCALE).round() as i64;
    let lng_cell = (lng * CLUSTER_GRID_SCALE).round() as i64;
    format!("{}:{}", lat_cell, lng_cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_symmetry() {
        let pairs = [
            (40.0, -74.0, 40.01, -74.02),
            (48.8566, 2.3522, 48.8606, 2.3376),
            (-33.8688, 151.2093, -33.8568, 151.2153),
        ];
        for (lat1, lng1, lat2, lng2) in pairs {
            let ab = distance_km(lat1, lng1, lat2, lng2);
            let ba = distance_km(lat2, lng2, lat1, lng1);
            assert!((ab - ba).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        assert!(distance_km(40.0, -74.0, 40.0, -74.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_known_value() {
        // ~1.11 km por grado/100 de latitud
        let d = distance_km(40.0, -74.0, 40.01, -74.0);
        assert!(d > 1.0 && d < 1.2, "expected ~1.11 km, got {}", d);
    }

    #[test]
    fn test_cluster_key_deterministic() {
        assert_eq!(cluster_key(40.0, -74.0), cluster_key(40.0, -74.0));
    }

    #[test]
    fn test_cluster_key_same_cell() {
        // Dos puntos a ~100 m caen en la misma celda de 500 m
        let a = cluster_key(40.0001, -74.0001);
        let b = cluster_key(40.0005, -74.0005);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cluster_key_distinct_cells() {
        // Puntos a varios kilómetros nunca comparten celda
        let a = cluster_key(40.0, -74.0);
        let b = cluster_key(40.1, -74.0);
        assert_ne!(a, b);
    }
}
