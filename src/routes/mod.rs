//! Rutas de la API

pub mod analytics_routes;
pub mod dispatch_routes;
pub mod driver_routes;
pub mod event_routes;
pub mod ride_routes;
pub mod safety_routes;
