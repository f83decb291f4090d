//! Vehicle aggregate
//!
//! A vehicle exists only while it is parked.

pub mod model;

pub use model::{ParkingTicket, Vehicle, VehicleType};
