//! Repositorio de conductores
//!
//! Queries sobre la tabla drivers, incluyendo los claims condicionales
//! que protegen contra dispatch concurrente.

use crate::models::Driver;
use crate::utils::errors::AppError;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        event_id: Uuid,
        driver_name: String,
        max_capacity: i32,
    ) -> Result<Driver, AppError> {
        let id = Uuid::new_v4();

        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers
                (id, event_id, driver_name, is_online, status, max_capacity,
                 current_passenger_load, created_at)
            VALUES ($1, $2, $3, FALSE, 'offline', $4, 0, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(event_id)
        .bind(driver_name)
        .bind(max_capacity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error creating driver: {}", e)))?;

        Ok(driver)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error finding driver: {}", e)))?;

        Ok(driver)
    }

    pub async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT * FROM drivers WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing drivers: {}", e)))?;

        Ok(drivers)
    }

    /// Conductores elegibles para dispatch: online, disponibles y con
    /// ubicación conocida
    pub async fn find_available(&self, event_id: Uuid) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE event_id = $1 AND is_online = TRUE AND status = 'available'
              AND current_lat IS NOT NULL AND current_lng IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing available drivers: {}", e)))?;

        Ok(drivers)
    }

    /// Conductores con capacidad libre >= requerida, ordenados por
    /// capacidad libre descendente (primero los de más holgura)
    pub async fn find_with_capacity(
        &self,
        event_id: Uuid,
        required_capacity: i32,
    ) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE event_id = $1 AND is_online = TRUE AND status = 'available'
              AND current_lat IS NOT NULL AND current_lng IS NOT NULL
              AND max_capacity - current_passenger_load >= $2
            ORDER BY max_capacity - current_passenger_load DESC, created_at ASC
            "#,
        )
        .bind(event_id)
        .bind(required_capacity)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error listing drivers with capacity: {}", e)))?;

        Ok(drivers)
    }

    pub async fn update_location(&self, id: Uuid, lat: f64, lng: f64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE drivers SET current_lat = $2, current_lng = $3 WHERE id = $1")
            .bind(id)
            .bind(lat)
            .bind(lng)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error updating driver location: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Driver not found".to_string()));
        }

        Ok(())
    }

    /// Poner al conductor online (status available) u offline.
    /// No se puede ir offline con un viaje o batch activo asignado.
    pub async fn set_online(&self, id: Uuid, online: bool) -> Result<Driver, AppError> {
        let query = if online {
            r#"
            UPDATE drivers SET is_online = TRUE, status = 'available'
            WHERE id = $1 AND status <> 'assigned'
            RETURNING *
            "#
        } else {
            r#"
            UPDATE drivers SET is_online = FALSE, status = 'offline'
            WHERE id = $1 AND status <> 'assigned'
            RETURNING *
            "#
        };

        let driver = sqlx::query_as::<_, Driver>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error updating driver presence: {}", e)))?
            .ok_or_else(|| {
                AppError::Conflict("Driver has an active assignment or does not exist".to_string())
            })?;

        Ok(driver)
    }

    /// Claim condicional para dispatch: solo gana si el conductor sigue
    /// disponible al momento del write. Devuelve false si se perdió la
    /// carrera contra otro dispatch.
    pub async fn claim_for_assignment(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE drivers SET status = 'assigned' WHERE id = $1 AND status = 'available'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error claiming driver: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// Liberar al conductor: disponible y sin pasajeros
    pub async fn release(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE drivers SET status = 'available', current_passenger_load = 0 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error releasing driver: {}", e)))?;

        Ok(())
    }

    /// Eliminar un conductor; solo permitido mientras está offline
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1 AND status = 'offline'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Error deleting driver: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Forbidden(
                "Driver must be offline to be removed".to_string(),
            ));
        }

        Ok(())
    }
}
