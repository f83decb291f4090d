//! Parking spot aggregate

pub mod model;

pub use model::{ParkingSpot, SpotId, SpotOccupancy, SpotType};
