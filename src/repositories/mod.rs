//! Repositorios: todo el SQL de la aplicación
//!
//! Cada repositorio recibe el pool por constructor (sin cliente global).

pub mod batch_repository;
pub mod driver_repository;
pub mod event_repository;
pub mod ride_repository;
pub mod safety_repository;

pub use batch_repository::BatchRepository;
pub use driver_repository::DriverRepository;
pub use event_repository::EventRepository;
pub use ride_repository::RideRepository;
pub use safety_repository::SafetyRepository;
