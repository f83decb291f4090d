//! Parking bounded context
//!
//! - `service`: the spot-allocation and release engine

pub mod service;

pub use service::ParkingLotService;
