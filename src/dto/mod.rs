//! DTOs de entrada/salida de la API

pub mod dispatch_dto;
pub mod driver_dto;
pub mod event_dto;
pub mod response;
pub mod ride_dto;
pub mod safety_dto;
