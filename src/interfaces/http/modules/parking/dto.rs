//! Parking lot DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{ParkingTicket, SpotId, SpotOccupancy, VehicleType};

/// Request to park a vehicle
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ParkVehicleRequest {
    /// Vehicle identifier, unique among parked vehicles
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "ABC-123")]
    pub id: String,
    /// MOTORCYCLE, CAR or VAN
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "CAR")]
    pub vehicle_type: VehicleType,
}

/// Spots assigned to a parked vehicle
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParkingTicketDto {
    pub vehicle_id: String,
    pub vehicle_type: String,
    pub spot_ids: Vec<SpotId>,
    /// RFC 3339 timestamp
    pub parked_at: String,
}

impl From<ParkingTicket> for ParkingTicketDto {
    fn from(t: ParkingTicket) -> Self {
        Self {
            vehicle_id: t.vehicle_id,
            vehicle_type: t.vehicle_type.to_string(),
            spot_ids: t.spot_ids,
            parked_at: t.parked_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveResponse {
    pub vehicle_id: String,
    pub released_spot_ids: Vec<SpotId>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemainingSpotsResponse {
    pub remaining_spots: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IsFullResponse {
    pub vehicle_type: String,
    pub is_full: bool,
}

/// Occupancy of one spot category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotOccupancyDto {
    pub spot_type: String,
    pub total: u64,
    pub free: u64,
    pub occupied: u64,
}

impl From<SpotOccupancy> for SpotOccupancyDto {
    fn from(o: SpotOccupancy) -> Self {
        Self {
            spot_type: o.spot_type.to_string(),
            total: o.total,
            free: o.free,
            occupied: o.occupied(),
        }
    }
}
