//! Parking spot domain entity

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// Durable spot identifier, assigned at provisioning time and never reused
pub type SpotId = i32;

/// Spot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotType {
    Motorcycle,
    Compact,
    Regular,
}

impl SpotType {
    pub const ALL: [SpotType; 3] = [SpotType::Motorcycle, SpotType::Compact, SpotType::Regular];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motorcycle => "MOTORCYCLE",
            Self::Compact => "COMPACT",
            Self::Regular => "REGULAR",
        }
    }
}

impl FromStr for SpotType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOTORCYCLE" => Ok(Self::Motorcycle),
            "COMPACT" => Ok(Self::Compact),
            "REGULAR" => Ok(Self::Regular),
            other => Err(DomainError::Validation(format!(
                "unknown spot type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SpotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A physical parking spot
///
/// `vehicle_id` is a back-reference to the occupant, never ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub spot_type: SpotType,
    pub vehicle_id: Option<String>,
}

impl ParkingSpot {
    pub fn new(id: SpotId, spot_type: SpotType) -> Self {
        Self {
            id,
            spot_type,
            vehicle_id: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.vehicle_id.is_none()
    }

    pub fn is_occupied_by(&self, vehicle_id: &str) -> bool {
        self.vehicle_id.as_deref() == Some(vehicle_id)
    }
}

/// Occupancy summary for one spot category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpotOccupancy {
    pub spot_type: SpotType,
    pub total: u64,
    pub free: u64,
}

impl SpotOccupancy {
    pub fn occupied(&self) -> u64 {
        self.total - self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spot_is_free() {
        let spot = ParkingSpot::new(1, SpotType::Compact);
        assert!(spot.is_free());
        assert!(!spot.is_occupied_by("Car1"));
    }

    #[test]
    fn occupied_spot_reports_occupant() {
        let spot = ParkingSpot {
            id: 2,
            spot_type: SpotType::Regular,
            vehicle_id: Some("Van1".into()),
        };
        assert!(!spot.is_free());
        assert!(spot.is_occupied_by("Van1"));
        assert!(!spot.is_occupied_by("Van2"));
    }

    #[test]
    fn spot_type_round_trips_through_str() {
        for spot_type in SpotType::ALL {
            assert_eq!(spot_type.as_str().parse::<SpotType>().unwrap(), spot_type);
        }
        assert!("HUGE".parse::<SpotType>().is_err());
    }

    #[test]
    fn occupancy_counts_occupied() {
        let o = SpotOccupancy {
            spot_type: SpotType::Regular,
            total: 5,
            free: 2,
        };
        assert_eq!(o.occupied(), 3);
    }
}
