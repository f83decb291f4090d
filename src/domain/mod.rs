pub mod policy;
pub mod repositories;
pub mod spot;
pub mod vehicle;

// Re-export commonly used types
pub use policy::{PolicyError, PolicyRule, VehicleTypePolicy};
pub use repositories::{DomainResult, LotStore, LotTransaction};
pub use spot::{ParkingSpot, SpotId, SpotOccupancy, SpotType};
pub use vehicle::{ParkingTicket, Vehicle, VehicleType};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
