//! Vehicle-type policy
//!
//! Declarative table mapping each vehicle category to the number of spots it
//! consumes and the spot categories it may occupy, in priority order.
//!
//! | Vehicle    | Spots | Eligible spot categories |
//! |------------|-------|--------------------------|
//! | MOTORCYCLE | 1     | MOTORCYCLE               |
//! | CAR        | 1     | COMPACT, REGULAR         |
//! | VAN        | 3     | REGULAR                  |

use thiserror::Error;

use super::spot::SpotType;
use super::vehicle::VehicleType;

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    /// Spots a vehicle of this category occupies (>= 1)
    pub spots_required: u32,
    /// Spot categories it may occupy, highest priority first (non-empty)
    pub eligible: Vec<SpotType>,
}

impl PolicyRule {
    pub fn new(spots_required: u32, eligible: impl Into<Vec<SpotType>>) -> Self {
        Self {
            spots_required,
            eligible: eligible.into(),
        }
    }

    fn validate(&self, vehicle_type: VehicleType) -> Result<(), PolicyError> {
        if self.spots_required == 0 {
            return Err(PolicyError::ZeroSpots(vehicle_type));
        }
        if self.eligible.is_empty() {
            return Err(PolicyError::NoEligibleSpots(vehicle_type));
        }
        for (i, spot_type) in self.eligible.iter().enumerate() {
            if self.eligible[..i].contains(spot_type) {
                return Err(PolicyError::DuplicateSpotType(vehicle_type, *spot_type));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{0} must require at least one spot")]
    ZeroSpots(VehicleType),

    #[error("{0} must have at least one eligible spot type")]
    NoEligibleSpots(VehicleType),

    #[error("{0} lists spot type {1} more than once")]
    DuplicateSpotType(VehicleType, SpotType),
}

/// Policy table, total over [`VehicleType::ALL`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleTypePolicy {
    rules: [PolicyRule; 3],
}

impl VehicleTypePolicy {
    /// The standard table.
    pub fn standard() -> Self {
        Self {
            rules: [
                PolicyRule::new(1, [SpotType::Motorcycle]),
                PolicyRule::new(1, [SpotType::Compact, SpotType::Regular]),
                PolicyRule::new(3, [SpotType::Regular]),
            ],
        }
    }

    /// Replace the rule for one vehicle category.
    pub fn with_rule(
        mut self,
        vehicle_type: VehicleType,
        rule: PolicyRule,
    ) -> Result<Self, PolicyError> {
        rule.validate(vehicle_type)?;
        self.rules[vehicle_type.index()] = rule;
        Ok(self)
    }

    pub fn rule(&self, vehicle_type: VehicleType) -> &PolicyRule {
        &self.rules[vehicle_type.index()]
    }

    pub fn spots_required(&self, vehicle_type: VehicleType) -> u32 {
        self.rule(vehicle_type).spots_required
    }

    pub fn eligible_spot_types(&self, vehicle_type: VehicleType) -> &[SpotType] {
        &self.rule(vehicle_type).eligible
    }

    /// Priority rank of `spot_type` for `vehicle_type` (0 = most preferred),
    /// `None` when the vehicle may not use that spot type.
    pub fn priority(&self, vehicle_type: VehicleType, spot_type: SpotType) -> Option<usize> {
        self.eligible_spot_types(vehicle_type)
            .iter()
            .position(|t| *t == spot_type)
    }
}

impl Default for VehicleTypePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table() {
        let policy = VehicleTypePolicy::standard();

        assert_eq!(policy.spots_required(VehicleType::Motorcycle), 1);
        assert_eq!(
            policy.eligible_spot_types(VehicleType::Motorcycle),
            &[SpotType::Motorcycle]
        );

        assert_eq!(policy.spots_required(VehicleType::Car), 1);
        assert_eq!(
            policy.eligible_spot_types(VehicleType::Car),
            &[SpotType::Compact, SpotType::Regular]
        );

        assert_eq!(policy.spots_required(VehicleType::Van), 3);
        assert_eq!(
            policy.eligible_spot_types(VehicleType::Van),
            &[SpotType::Regular]
        );
    }

    #[test]
    fn every_vehicle_type_has_a_valid_rule() {
        let policy = VehicleTypePolicy::standard();
        for vt in VehicleType::ALL {
            assert!(policy.rule(vt).validate(vt).is_ok(), "{vt}");
        }
    }

    #[test]
    fn priority_follows_eligible_order() {
        let policy = VehicleTypePolicy::standard();
        assert_eq!(policy.priority(VehicleType::Car, SpotType::Compact), Some(0));
        assert_eq!(policy.priority(VehicleType::Car, SpotType::Regular), Some(1));
        assert_eq!(policy.priority(VehicleType::Car, SpotType::Motorcycle), None);
        assert_eq!(policy.priority(VehicleType::Van, SpotType::Compact), None);
    }

    #[test]
    fn with_rule_replaces_one_row() {
        let policy = VehicleTypePolicy::standard()
            .with_rule(
                VehicleType::Motorcycle,
                PolicyRule::new(1, [SpotType::Motorcycle, SpotType::Compact]),
            )
            .unwrap();

        assert_eq!(
            policy.eligible_spot_types(VehicleType::Motorcycle),
            &[SpotType::Motorcycle, SpotType::Compact]
        );
        assert_eq!(
            policy.rule(VehicleType::Van),
            VehicleTypePolicy::standard().rule(VehicleType::Van)
        );
    }

    #[test]
    fn with_rule_rejects_invalid_rows() {
        let base = VehicleTypePolicy::standard();

        assert_eq!(
            base.clone()
                .with_rule(VehicleType::Van, PolicyRule::new(0, [SpotType::Regular]))
                .unwrap_err(),
            PolicyError::ZeroSpots(VehicleType::Van)
        );
        assert_eq!(
            base.clone()
                .with_rule(VehicleType::Car, PolicyRule::new(1, Vec::<SpotType>::new()))
                .unwrap_err(),
            PolicyError::NoEligibleSpots(VehicleType::Car)
        );
        assert_eq!(
            base.with_rule(
                VehicleType::Car,
                PolicyRule::new(1, [SpotType::Regular, SpotType::Regular])
            )
            .unwrap_err(),
            PolicyError::DuplicateSpotType(VehicleType::Car, SpotType::Regular)
        );
    }
}
