//! Vehicle domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::spot::SpotId;
use crate::shared::errors::DomainError;

/// Vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Motorcycle,
    Car,
    Van,
}

impl VehicleType {
    /// Every vehicle category, in declaration order.
    pub const ALL: [VehicleType; 3] = [VehicleType::Motorcycle, VehicleType::Car, VehicleType::Van];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motorcycle => "MOTORCYCLE",
            Self::Car => "CAR",
            Self::Van => "VAN",
        }
    }

    /// Position in [`VehicleType::ALL`].
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Motorcycle => 0,
            Self::Car => 1,
            Self::Van => 2,
        }
    }
}

impl FromStr for VehicleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOTORCYCLE" => Ok(Self::Motorcycle),
            "CAR" => Ok(Self::Car),
            "VAN" => Ok(Self::Van),
            other => Err(DomainError::Validation(format!(
                "unknown vehicle type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A currently parked vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Externally supplied identity (plate, ticket number, ...)
    pub id: String,
    pub vehicle_type: VehicleType,
    /// When the vehicle was parked
    pub parked_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, vehicle_type: VehicleType) -> Self {
        Self {
            id: id.into(),
            vehicle_type,
            parked_at: Utc::now(),
        }
    }
}

/// Outcome of a successful park
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingTicket {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    /// Spots assigned to the vehicle, in allocation order
    pub spot_ids: Vec<SpotId>,
    pub parked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("car".parse::<VehicleType>().unwrap(), VehicleType::Car);
        assert_eq!(" VAN ".parse::<VehicleType>().unwrap(), VehicleType::Van);
        assert_eq!(
            "Motorcycle".parse::<VehicleType>().unwrap(),
            VehicleType::Motorcycle
        );
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let err = "TRUCK".parse::<VehicleType>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&VehicleType::Motorcycle).unwrap(),
            "\"MOTORCYCLE\""
        );
        let parsed: VehicleType = serde_json::from_str("\"VAN\"").unwrap();
        assert_eq!(parsed, VehicleType::Van);
        assert!(serde_json::from_str::<VehicleType>("\"van\"").is_err());
    }

    #[test]
    fn index_matches_all_order() {
        for (i, vt) in VehicleType::ALL.iter().enumerate() {
            assert_eq!(vt.index(), i);
        }
    }

    #[test]
    fn new_vehicle_is_stamped() {
        let before = Utc::now();
        let v = Vehicle::new("Car1", VehicleType::Car);
        assert_eq!(v.id, "Car1");
        assert!(v.parked_at >= before);
    }
}
