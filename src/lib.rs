//! # Parking Lot Service
//!
//! Spot allocation for a parking lot with motorcycle, compact and regular
//! spots. Motorcycles, cars and vans park according to a vehicle-type policy
//! table; every park and leave is atomic under concurrent requests.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: vehicles, spots, the policy table and the store traits
//! - **application**: the allocation engine ([`ParkingLotService`])
//! - **infrastructure**: SeaORM/SQLite store and an in-memory store
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, retry with backoff, graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::ParkingLotService;
pub use domain::{
    DomainError, DomainResult, LotStore, ParkingTicket, SpotType, VehicleType, VehicleTypePolicy,
};

// Re-export storage for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryLotStore, SeaOrmLotStore};

// Re-export API router
pub use interfaces::http::create_api_router;
