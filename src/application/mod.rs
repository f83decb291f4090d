//! Application layer
//!
//! Use cases that orchestrate the domain against a `LotStore`.

pub mod parking;

pub use parking::ParkingLotService;
