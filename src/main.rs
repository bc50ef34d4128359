mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚕 Ride Dispatch - motor de dispatch para eventos");
    info!("=================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // CORS: permisivo en desarrollo, orígenes explícitos en producción
    let cors = if config.is_production() && !config.cors_origins.is_empty() {
        cors_middleware_with_origins(config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(pool, config);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/event", routes::event_routes::create_event_router())
        .nest("/api/ride", routes::ride_routes::create_ride_router())
        .nest("/api/driver", routes::driver_routes::create_driver_router())
        .nest("/api/dispatch", routes::dispatch_routes::create_dispatch_router())
        .nest("/api/safety", routes::safety_routes::create_safety_router())
        .nest("/api/analytics", routes::analytics_routes::create_analytics_router())
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🎪 Eventos:");
    info!("   POST /api/event - Crear evento");
    info!("   GET  /api/event/:id - Obtener evento");
    info!("   POST /api/event/:id/close - Cerrar evento");
    info!("🚕 Rides:");
    info!("   POST /api/ride - Crear ride request");
    info!("   GET  /api/ride/:id - Obtener ride");
    info!("   GET  /api/ride/event/:event_id - Rides por evento");
    info!("   POST /api/ride/:id/cancel - Cancelar ride");
    info!("   POST /api/ride/:id/confirm-presence - Confirmar presencia del rider");
    info!("   GET  /api/ride/:id/queue-position - Posición en cola");
    info!("   GET  /api/ride/:id/batch-position - Posición en batch");
    info!("   POST /api/ride/:id/eta/refresh - Recalcular ETA del conductor");
    info!("🚗 Conductores:");
    info!("   POST /api/driver - Registrar conductor");
    info!("   GET  /api/driver/:id - Obtener conductor");
    info!("   GET  /api/driver?event_id= - Conductores por evento");
    info!("   POST /api/driver/:id/location - Actualizar ubicación");
    info!("   POST /api/driver/:id/online - Cambiar presencia");
    info!("   GET  /api/driver/:id/batch - Batch activo con ruta");
    info!("   DELETE /api/driver/:id - Eliminar conductor (offline)");
    info!("📦 Dispatch:");
    info!("   POST /api/dispatch/smart - Asignación individual");
    info!("   POST /api/dispatch/all - Barrido completo");
    info!("   POST /api/dispatch/batch - Batching por clusters");
    info!("   POST /api/dispatch/pickup - Marcar pickup hecho");
    info!("   POST /api/dispatch/complete-batch - Completar batch");
    info!("🛡️ Seguridad:");
    info!("   GET  /api/safety/expired - Rides con deadline vencido");
    info!("   POST /api/safety/no-show - Procesar no-show");
    info!("   GET  /api/safety/cooldown - Estado de cooldown");
    info!("   POST /api/safety/consent - Registrar consentimiento");
    info!("   POST /api/safety/emergency - Registrar emergencia");
    info!("📊 Analytics:");
    info!("   GET  /api/analytics/:event_id - Métricas del evento");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "ride-dispatch",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
