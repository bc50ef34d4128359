//! Services: la lógica de negocio del motor de dispatch
//!
//! Los services encapsulan las operaciones que tocan múltiples filas o
//! integraciones externas; todo el cambio de estado de un ride pasa por
//! LifecycleService.

pub mod analytics_service;
pub mod batch_service;
pub mod change_feed;
pub mod dispatch_service;
pub mod eta_service;
pub mod lifecycle_service;
pub mod safety_service;
