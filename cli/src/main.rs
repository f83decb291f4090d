//! Parking lot CLI server
//!
//! Headless parking lot service suitable for deployment as a systemd
//! service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/parking-lot/config.toml)
//! parking-lot
//!
//! # Custom config path
//! parking-lot --config /etc/parking-lot/config.toml
//!
//! # Override the API port
//! parking-lot --api-port 8080
//!
//! # Validate config without starting
//! parking-lot --check
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};

use parking_lot_service::config::AppConfig;
use parking_lot_service::shared::ConfigError;
use parking_lot_service::server::{init_tracing, ServerHandle, ServerOptions};
use parking_lot_service::VehicleType;

/// Parking lot spot allocation server.
#[derive(Parser, Debug)]
#[command(
    name = "parking-lot",
    version,
    about = "Parking lot spot allocation service",
    long_about = "REST API server that parks motorcycles, cars and vans into \
                  motorcycle, compact and regular spots.\n\n\
                  Default config: ~/.config/parking-lot/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_LOT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Do not provision spots into an empty lot.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(parking_lot_service::default_config_path);

    if cli.check {
        let config = load_config(&cli, &config_path)?;
        print_summary(&config_path, &config)?;
        return Ok(());
    }

    // A file that exists but does not validate is fatal; only a missing
    // file is replaced with defaults.
    let config = match load_config(&cli, &config_path) {
        Ok(cfg) => {
            // Init tracing first so subsequent logs are formatted properly
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let level = cli.log_level.clone().unwrap_or_else(|| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(level))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_lot: !cli.no_seed,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}

/// Load the config file and apply the CLI overrides on top.
fn load_config(cli: &Cli, config_path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn print_summary(
    config_path: &Path,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = config.policy()?;

    println!("Configuration is valid");
    println!("   Config file : {}", config_path.display());
    println!(
        "   API address : {}:{}",
        config.server.api_host, config.server.api_port
    );
    println!("   Storage     : {:?}", config.database.backend);
    println!("   Database    : {}", config.database.connection_url());
    println!("   Log level   : {}", config.logging.level);
    println!(
        "   Lot         : {} motorcycle, {} compact, {} regular",
        config.lot.motorcycle_spots, config.lot.compact_spots, config.lot.regular_spots
    );
    for vehicle_type in VehicleType::ALL {
        let eligible: Vec<&str> = policy
            .eligible_spot_types(vehicle_type)
            .iter()
            .map(|s| s.as_str())
            .collect();
        println!(
            "   {:<11} : {} spot(s) in {}",
            vehicle_type.as_str(),
            policy.spots_required(vehicle_type),
            eligible.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, contents: Option<&str>) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("parking-lot-cli-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        path
    }

    #[test]
    fn invalid_policy_row_stops_startup() {
        let path = temp_config(
            "bad-policy",
            Some(
                r#"
                [[lot.policy]]
                vehicle_type = "VAN"
                spots_required = 0
                eligible = ["REGULAR"]
                "#,
            ),
        );
        let cli = Cli::parse_from(["parking-lot"]);

        let err = load_config(&cli, &path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn missing_file_falls_back_to_defaults_with_overrides() {
        let path = temp_config("missing", None);
        let cli = Cli::parse_from(["parking-lot", "--api-port", "9090", "-l", "debug"]);

        let config = load_config(&cli, &path).unwrap();
        assert_eq!(config.server.api_port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert!(path.exists());
    }
}
