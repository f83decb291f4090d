use thiserror::Error;

use crate::domain::VehicleType;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Vehicle {0} is already parked")]
    AlreadyParked(String),

    #[error("No available spots for {0}")]
    NoAvailableSpots(VehicleType),

    #[error("Vehicle {0} not found")]
    VehicleNotFound(String),

    #[error("Validation: {0}")]
    Validation(String),

    /// Lost a race against a concurrent writer. The whole operation can be retried.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is transient and the operation may succeed if retried.
    ///
    /// Business rejections are deterministic for a given lot state, so only
    /// concurrency conflicts qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }

    /// Conflict-class business rejections (a park that cannot proceed).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::AlreadyParked(_) | DomainError::NoAvailableSpots(_)
        )
    }

    /// Short stable label, used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::AlreadyParked(_) => "already_parked",
            DomainError::NoAvailableSpots(_) => "no_available_spots",
            DomainError::VehicleNotFound(_) => "not_found",
            DomainError::Validation(_) => "validation",
            DomainError::Conflict(_) => "conflict",
            DomainError::Storage(_) => "storage",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflict_is_transient() {
        assert!(DomainError::Conflict("spot 3".into()).is_transient());
        assert!(!DomainError::AlreadyParked("A".into()).is_transient());
        assert!(!DomainError::NoAvailableSpots(VehicleType::Van).is_transient());
        assert!(!DomainError::VehicleNotFound("A".into()).is_transient());
        assert!(!DomainError::Storage("disk full".into()).is_transient());
    }

    #[test]
    fn park_rejections_share_conflict_class() {
        assert!(DomainError::AlreadyParked("A".into()).is_conflict());
        assert!(DomainError::NoAvailableSpots(VehicleType::Car).is_conflict());
        assert!(!DomainError::VehicleNotFound("A".into()).is_conflict());
        assert!(!DomainError::Conflict("x".into()).is_conflict());
    }

    #[test]
    fn messages_name_the_subject() {
        assert_eq!(
            DomainError::AlreadyParked("Motorcycle1".into()).to_string(),
            "Vehicle Motorcycle1 is already parked"
        );
        assert_eq!(
            DomainError::VehicleNotFound("ghost".into()).to_string(),
            "Vehicle ghost not found"
        );
        assert_eq!(
            DomainError::NoAvailableSpots(VehicleType::Van).to_string(),
            "No available spots for VAN"
        );
    }
}
