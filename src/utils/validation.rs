//! Utilidades de validación
//!
//! Funciones helper para validación de datos de entrada.

use uuid::Uuid;
use validator::ValidationError;

/// Validar que una latitud esté en rango
pub fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&value) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que una longitud esté en rango
pub fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    if !(-180.0..=180.0).contains(&value) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Hash pseudónimo de rider: evento + nombre + origen, sin PII en claro.
pub fn rider_hash(event_id: Uuid, rider_name: &str, origin: &str) -> String {
    let digest = md5::compute(format!("{}:{}:{}", event_id, rider_name.trim().to_lowercase(), origin));
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(40.0).is_ok());
        assert!(validate_latitude(-91.0).is_err());
        assert!(validate_latitude(91.0).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(-74.0).is_ok());
        assert!(validate_longitude(-181.0).is_err());
    }

    #[test]
    fn test_rider_hash_stable_and_case_insensitive() {
        let event = Uuid::nil();
        let a = rider_hash(event, "Alice", "10 Main St");
        let b = rider_hash(event, "alice", "10 Main St");
        assert_eq!(a, b);
        let c = rider_hash(event, "Bob", "10 Main St");
        assert_ne!(a, c);
    }
}
