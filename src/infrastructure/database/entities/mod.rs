//! Database entities module

pub mod parking_spot;
pub mod vehicle;

pub use parking_spot::Entity as ParkingSpot;
pub use vehicle::Entity as Vehicle;
