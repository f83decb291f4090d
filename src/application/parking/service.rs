//! Spot allocation and release engine
//!
//! Every `park` / `leave` runs as one store transaction: the existence check,
//! the availability check and the writes either all commit or all roll back.
//! A transaction that loses a race to a concurrent writer is replayed from
//! scratch (bounded by the retry config); business rejections are returned
//! as-is.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    DomainError, DomainResult, LotStore, LotTransaction, ParkingSpot, ParkingTicket, SpotId,
    SpotOccupancy, Vehicle, VehicleType, VehicleTypePolicy,
};
use crate::shared::utills::retry::{retry_with_backoff, RetryConfig};

/// Service for parking and unparking vehicles
pub struct ParkingLotService {
    store: Arc<dyn LotStore>,
    policy: VehicleTypePolicy,
    retry: RetryConfig,
}

impl ParkingLotService {
    pub fn new(store: Arc<dyn LotStore>, policy: VehicleTypePolicy) -> Self {
        Self {
            store,
            policy,
            retry: RetryConfig::default(),
        }
    }

    /// Override how conflicting transactions are retried
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn policy(&self) -> &VehicleTypePolicy {
        &self.policy
    }

    /// Park a vehicle, claiming exactly `spots_required` eligible free spots.
    ///
    /// Fails with `AlreadyParked` if the id is currently parked (whatever its
    /// type) and with `NoAvailableSpots` if too few eligible spots are free.
    pub async fn park(
        &self,
        vehicle_id: &str,
        vehicle_type: VehicleType,
    ) -> DomainResult<ParkingTicket> {
        validate_vehicle_id(vehicle_id)?;

        let result = retry_with_backoff(
            self.retry.clone(),
            || self.try_park(vehicle_id, vehicle_type),
            DomainError::is_transient,
            "park",
        )
        .await;
        record_outcome("park", &result);

        match &result {
            Ok(ticket) => info!(
                vehicle_id,
                vehicle_type = %vehicle_type,
                spots = ?ticket.spot_ids,
                "Vehicle parked"
            ),
            Err(e) => debug!(vehicle_id, vehicle_type = %vehicle_type, error = %e, "Park rejected"),
        }
        result
    }

    /// Release every spot held by the vehicle and forget it.
    ///
    /// Returns the released spot ids. Fails with `VehicleNotFound` if the id
    /// is not currently parked.
    pub async fn leave(&self, vehicle_id: &str) -> DomainResult<Vec<SpotId>> {
        validate_vehicle_id(vehicle_id)?;

        let result = retry_with_backoff(
            self.retry.clone(),
            || self.try_leave(vehicle_id),
            DomainError::is_transient,
            "leave",
        )
        .await;
        record_outcome("leave", &result);

        match &result {
            Ok(spots) => info!(vehicle_id, spots = ?spots, "Vehicle left"),
            Err(e) => debug!(vehicle_id, error = %e, "Leave rejected"),
        }
        result
    }

    /// Free spots across all types
    pub async fn remaining_spots(&self) -> DomainResult<u64> {
        self.store.count_free_spots().await
    }

    /// Whether a `park` of this type would currently be rejected for lack of spots.
    ///
    /// Point-in-time read: nothing is reserved.
    pub async fn is_full(&self, vehicle_type: VehicleType) -> DomainResult<bool> {
        let free = self
            .store
            .count_free_spots_by_types(self.policy.eligible_spot_types(vehicle_type))
            .await?;
        Ok(free < u64::from(self.policy.spots_required(vehicle_type)))
    }

    /// Total and free spots per spot type
    pub async fn occupancy(&self) -> DomainResult<Vec<SpotOccupancy>> {
        self.store.occupancy().await
    }

    async fn try_park(
        &self,
        vehicle_id: &str,
        vehicle_type: VehicleType,
    ) -> DomainResult<ParkingTicket> {
        let mut txn = self.store.begin().await?;
        let outcome = self.allocate(txn.as_mut(), vehicle_id, vehicle_type).await;
        finish(txn, outcome).await
    }

    async fn allocate(
        &self,
        txn: &mut dyn LotTransaction,
        vehicle_id: &str,
        vehicle_type: VehicleType,
    ) -> DomainResult<ParkingTicket> {
        if txn.vehicle_exists(vehicle_id).await? {
            return Err(DomainError::AlreadyParked(vehicle_id.to_string()));
        }

        let required = self.policy.spots_required(vehicle_type) as usize;
        let candidates = self.candidate_spots(txn, vehicle_type).await?;
        if candidates.len() < required {
            return Err(DomainError::NoAvailableSpots(vehicle_type));
        }

        let vehicle = Vehicle::new(vehicle_id, vehicle_type);
        txn.insert_vehicle(&vehicle).await?;

        let spot_ids: Vec<SpotId> = candidates.iter().take(required).map(|s| s.id).collect();
        for &spot_id in &spot_ids {
            txn.occupy(spot_id, vehicle_id).await?;
        }

        Ok(ParkingTicket {
            vehicle_id: vehicle.id,
            vehicle_type,
            spot_ids,
            parked_at: vehicle.parked_at,
        })
    }

    /// Free eligible spots, preferred spot types first, then ascending id.
    async fn candidate_spots(
        &self,
        txn: &mut dyn LotTransaction,
        vehicle_type: VehicleType,
    ) -> DomainResult<Vec<ParkingSpot>> {
        let mut spots = txn
            .free_spots_by_types(self.policy.eligible_spot_types(vehicle_type))
            .await?;
        spots.sort_by_key(|s| {
            (
                self.policy
                    .priority(vehicle_type, s.spot_type)
                    .unwrap_or(usize::MAX),
                s.id,
            )
        });
        Ok(spots)
    }

    async fn try_leave(&self, vehicle_id: &str) -> DomainResult<Vec<SpotId>> {
        let mut txn = self.store.begin().await?;
        let outcome = release(txn.as_mut(), vehicle_id).await;
        finish(txn, outcome).await
    }
}

async fn release(txn: &mut dyn LotTransaction, vehicle_id: &str) -> DomainResult<Vec<SpotId>> {
    if !txn.vehicle_exists(vehicle_id).await? {
        return Err(DomainError::VehicleNotFound(vehicle_id.to_string()));
    }

    let spot_ids = txn.spots_occupied_by(vehicle_id).await?;
    for &spot_id in &spot_ids {
        txn.release(spot_id).await?;
    }
    txn.delete_vehicle(vehicle_id).await?;

    Ok(spot_ids)
}

/// Commit on success, roll back on any error. The operation error wins over a
/// failed rollback.
async fn finish<T>(txn: Box<dyn LotTransaction>, outcome: DomainResult<T>) -> DomainResult<T> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "Rollback failed after: {}", err);
            }
            Err(err)
        }
    }
}

fn validate_vehicle_id(vehicle_id: &str) -> DomainResult<()> {
    if vehicle_id.trim().is_empty() {
        return Err(DomainError::Validation(
            "vehicle id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn record_outcome<T>(operation: &'static str, result: &DomainResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!("parking_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

// ── Tests ──────────────────────────────────────────────────────
