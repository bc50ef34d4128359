//! Controladores de la API
//!
//! Capa fina entre las rutas y los services: validación de entrada,
//! armado de DTOs y publicación de eventos de cambio.

pub mod analytics_controller;
pub mod dispatch_controller;
pub mod driver_controller;
pub mod event_controller;
pub mod ride_controller;
pub mod safety_controller;
