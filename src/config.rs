//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/parking-lot/config.toml`).
//! Every section and field has a default, so a partial file is valid. A
//! missing file is created with the defaults.
//!
//! ```toml
//! [server]
//! api_host = "0.0.0.0"
//! api_port = 8080
//!
//! [database]
//! backend = "sqlite"
//! path = "parking.db"
//!
//! [lot]
//! motorcycle_spots = 10
//! compact_spots = 20
//! regular_spots = 20
//!
//! [[lot.policy]]
//! vehicle_type = "VAN"
//! spots_required = 2
//! eligible = ["REGULAR"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{PolicyRule, SpotType, VehicleType, VehicleTypePolicy};
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::errors::ConfigError;
use crate::shared::utills::retry::RetryConfig;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub lot: LotConfig,
    pub allocation: AllocationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Process-local, lost on restart
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    /// SQLite file, used when `url` is not set
    pub path: String,
    /// Explicit connection URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: "parking.db".to_string(),
            url: None,
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            max_connections: self.max_connections,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or a full `EnvFilter` directive
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Lot layout and policy overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    pub motorcycle_spots: u32,
    pub compact_spots: u32,
    pub regular_spots: u32,
    /// Rows replacing the standard policy for their vehicle type
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy: Vec<PolicyOverride>,
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            motorcycle_spots: 10,
            compact_spots: 20,
            regular_spots: 20,
            policy: Vec::new(),
        }
    }
}

impl LotConfig {
    /// Spots to provision per type. Spot ids follow this order.
    pub fn layout(&self) -> Vec<(SpotType, u32)> {
        vec![
            (SpotType::Motorcycle, self.motorcycle_spots),
            (SpotType::Compact, self.compact_spots),
            (SpotType::Regular, self.regular_spots),
        ]
    }

    pub fn total_spots(&self) -> u64 {
        self.layout().iter().map(|&(_, n)| u64::from(n)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub vehicle_type: VehicleType,
    pub spots_required: u32,
    pub eligible: Vec<SpotType>,
}

/// Retry of transactions that lost a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 250,
        }
    }
}

impl AllocationConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

impl AppConfig {
    /// Load from `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.format.to_lowercase().as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                    other
                )))
            }
        }
        if self.allocation.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "allocation.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.allocation.initial_backoff_ms > self.allocation.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "allocation.initial_backoff_ms exceeds allocation.max_backoff_ms".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        self.policy()?;
        Ok(())
    }

    /// Standard policy with the `[[lot.policy]]` rows applied.
    pub fn policy(&self) -> Result<VehicleTypePolicy, ConfigError> {
        self.lot
            .policy
            .iter()
            .try_fold(VehicleTypePolicy::standard(), |policy, row| {
                policy.with_rule(
                    row.vehicle_type,
                    PolicyRule::new(row.spots_required, row.eligible.clone()),
                )
            })
            .map_err(|e| ConfigError::Invalid(format!("lot.policy: {}", e)))
    }
}

/// `<config dir>/parking-lot/config.toml`, falling back to the working directory
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parking-lot")
        .join("config.toml")
}
