//! Store boundary for the parking lot
//!
//! Contains:
//! - `LotStore`: shared handle that opens transactions and answers point-in-time reads
//! - `LotTransaction`: the unit of work every park/leave runs inside
//! - `DomainResult`: standard result type for domain operations
//!
//! ```ignore
//! let mut txn = store.begin().await?;
//! if txn.vehicle_exists("Car1").await? { ... }
//! txn.occupy(3, "Car1").await?;
//! txn.commit().await?;
//! ```

use async_trait::async_trait;

use super::spot::{ParkingSpot, SpotId, SpotOccupancy, SpotType};
use super::vehicle::Vehicle;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Operations available inside one store transaction.
///
/// Effects become visible to other callers only after [`commit`]. Dropping
/// the transaction without committing discards them.
///
/// [`commit`]: LotTransaction::commit
#[async_trait]
pub trait LotTransaction: Send {
    /// Whether a vehicle with this id is currently parked
    async fn vehicle_exists(&mut self, vehicle_id: &str) -> DomainResult<bool>;

    /// Record a parked vehicle. Fails with `AlreadyParked` if the id is present.
    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> DomainResult<()>;

    /// Remove a vehicle record. Fails with `VehicleNotFound` if nothing was removed.
    async fn delete_vehicle(&mut self, vehicle_id: &str) -> DomainResult<()>;

    /// Free spots whose type is in `spot_types`, ascending by id
    async fn free_spots_by_types(&mut self, spot_types: &[SpotType])
        -> DomainResult<Vec<ParkingSpot>>;

    /// Number of free spots across all types
    async fn count_free_spots(&mut self) -> DomainResult<u64>;

    /// Mark a free spot as occupied by `vehicle_id`.
    ///
    /// Fails with `Conflict` if the spot is no longer free.
    async fn occupy(&mut self, spot_id: SpotId, vehicle_id: &str) -> DomainResult<()>;

    /// Spots currently referencing `vehicle_id`, ascending by id
    async fn spots_occupied_by(&mut self, vehicle_id: &str) -> DomainResult<Vec<SpotId>>;

    /// Clear the occupant of a spot
    async fn release(&mut self, spot_id: SpotId) -> DomainResult<()>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

/// Shared handle to the spot/vehicle store.
#[async_trait]
pub trait LotStore: Send + Sync {
    /// Open a transaction scoped to one top-level operation
    async fn begin(&self) -> DomainResult<Box<dyn LotTransaction>>;

    /// Number of free spots across all types (point-in-time read)
    async fn count_free_spots(&self) -> DomainResult<u64>;

    /// Number of free spots whose type is in `spot_types` (point-in-time read)
    async fn count_free_spots_by_types(&self, spot_types: &[SpotType]) -> DomainResult<u64>;

    /// Total and free spots per type, for every type in [`SpotType::ALL`]
    async fn occupancy(&self) -> DomainResult<Vec<SpotOccupancy>>;

    /// Add `count` spots of each listed type if the lot has no spots yet.
    ///
    /// Returns the number of spots created (0 when the lot was already provisioned).
    async fn provision_spots(&self, layout: &[(SpotType, u32)]) -> DomainResult<u64>;

    /// Cheap liveness probe
    async fn ping(&self) -> DomainResult<()>;
}
