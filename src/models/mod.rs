//! Modelos de dominio
//!
//! Structs que mapean exactamente al schema PostgreSQL.

pub mod batch;
pub mod driver;
pub mod event;
pub mod penalty;
pub mod ride;

pub use batch::{BatchStatus, RideBatch, RideBatchItem};
pub use driver::{Driver, DriverStatus};
pub use event::Event;
pub use penalty::{EmergencyEvent, RiderConsent, RiderPenalty};
pub use ride::{RideRequest, RideStatus};
