//! In-memory lot store for development and testing
//!
//! A transaction takes an owned lock on the whole lot and works on a staged
//! copy, so writers are serialized and uncommitted effects are never visible.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    DomainError, DomainResult, LotStore, LotTransaction, ParkingSpot, SpotId, SpotOccupancy,
    SpotType, Vehicle,
};

#[derive(Debug, Clone)]
struct LotState {
    spots: BTreeMap<SpotId, ParkingSpot>,
    vehicles: HashMap<String, Vehicle>,
    next_spot_id: SpotId,
}

impl LotState {
    fn new() -> Self {
        Self {
            spots: BTreeMap::new(),
            vehicles: HashMap::new(),
            next_spot_id: 1,
        }
    }

    fn count_free(&self, spot_types: Option<&[SpotType]>) -> u64 {
        self.spots
            .values()
            .filter(|s| s.is_free())
            .filter(|s| spot_types.map_or(true, |types| types.contains(&s.spot_type)))
            .count() as u64
    }

    fn provision(&mut self, layout: &[(SpotType, u32)]) -> u64 {
        if !self.spots.is_empty() {
            return 0;
        }
        let mut created = 0;
        for &(spot_type, count) in layout {
            for _ in 0..count {
                let id = self.next_spot_id;
                self.next_spot_id += 1;
                self.spots.insert(id, ParkingSpot::new(id, spot_type));
                created += 1;
            }
        }
        created
    }
}

/// In-memory lot store
pub struct InMemoryLotStore {
    state: Arc<Mutex<LotState>>,
}

impl InMemoryLotStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LotState::new())),
        }
    }

    /// Store pre-provisioned with `count` spots per type, ids assigned in layout order.
    pub fn with_spots(layout: &[(SpotType, u32)]) -> Self {
        let mut state = LotState::new();
        state.provision(layout);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Copy of every spot, ascending by id
    pub async fn spots(&self) -> Vec<ParkingSpot> {
        self.state.lock().await.spots.values().cloned().collect()
    }

    /// Copy of a parked vehicle record
    pub async fn vehicle(&self, vehicle_id: &str) -> Option<Vehicle> {
        self.state.lock().await.vehicles.get(vehicle_id).cloned()
    }
}

impl Default for InMemoryLotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LotStore for InMemoryLotStore {
    async fn begin(&self) -> DomainResult<Box<dyn LotTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryLotTransaction { guard, staged }))
    }

    async fn count_free_spots(&self) -> DomainResult<u64> {
        Ok(self.state.lock().await.count_free(None))
    }

    async fn count_free_spots_by_types(&self, spot_types: &[SpotType]) -> DomainResult<u64> {
        Ok(self.state.lock().await.count_free(Some(spot_types)))
    }

    async fn occupancy(&self) -> DomainResult<Vec<SpotOccupancy>> {
        let state = self.state.lock().await;
        Ok(SpotType::ALL
            .iter()
            .map(|&spot_type| {
                let of_type = state.spots.values().filter(|s| s.spot_type == spot_type);
                let (total, free) = of_type.fold((0, 0), |(total, free), s| {
                    (total + 1, free + u64::from(s.is_free()))
                });
                SpotOccupancy {
                    spot_type,
                    total,
                    free,
                }
            })
            .collect())
    }

    async fn provision_spots(&self, layout: &[(SpotType, u32)]) -> DomainResult<u64> {
        Ok(self.state.lock().await.provision(layout))
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}

struct InMemoryLotTransaction {
    guard: OwnedMutexGuard<LotState>,
    staged: LotState,
}

impl InMemoryLotTransaction {
    fn spot_mut(&mut self, spot_id: SpotId) -> DomainResult<&mut ParkingSpot> {
        self.staged
            .spots
            .get_mut(&spot_id)
            .ok_or_else(|| DomainError::Storage(format!("spot {} does not exist", spot_id)))
    }
}

#[async_trait]
impl LotTransaction for InMemoryLotTransaction {
    async fn vehicle_exists(&mut self, vehicle_id: &str) -> DomainResult<bool> {
        Ok(self.staged.vehicles.contains_key(vehicle_id))
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> DomainResult<()> {
        if self.staged.vehicles.contains_key(&vehicle.id) {
            return Err(DomainError::AlreadyParked(vehicle.id.clone()));
        }
        self.staged
            .vehicles
            .insert(vehicle.id.clone(), vehicle.clone());
        Ok(())
    }

    async fn delete_vehicle(&mut self, vehicle_id: &str) -> DomainResult<()> {
        self.staged
            .vehicles
            .remove(vehicle_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::VehicleNotFound(vehicle_id.to_string()))
    }

    async fn free_spots_by_types(
        &mut self,
        spot_types: &[SpotType],
    ) -> DomainResult<Vec<ParkingSpot>> {
        Ok(self
            .staged
            .spots
            .values()
            .filter(|s| s.is_free() && spot_types.contains(&s.spot_type))
            .cloned()
            .collect())
    }

    async fn count_free_spots(&mut self) -> DomainResult<u64> {
        Ok(self.staged.count_free(None))
    }

    async fn occupy(&mut self, spot_id: SpotId, vehicle_id: &str) -> DomainResult<()> {
        let spot = self.spot_mut(spot_id)?;
        if let Some(occupant) = &spot.vehicle_id {
            return Err(DomainError::Conflict(format!(
                "spot {} is already occupied by {}",
                spot_id, occupant
            )));
        }
        spot.vehicle_id = Some(vehicle_id.to_string());
        Ok(())
    }

    async fn spots_occupied_by(&mut self, vehicle_id: &str) -> DomainResult<Vec<SpotId>> {
        Ok(self
            .staged
            .spots
            .values()
            .filter(|s| s.is_occupied_by(vehicle_id))
            .map(|s| s.id)
            .collect())
    }

    async fn release(&mut self, spot_id: SpotId) -> DomainResult<()> {
        self.spot_mut(spot_id)?.vehicle_id = None;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let InMemoryLotTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        Ok(())
    }
}
