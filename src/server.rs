//! Reusable parking lot server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! storage init, migrations, lot provisioning, REST API, metrics, and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::ParkingLotService;
use crate::config::{AppConfig, StorageBackend};
use crate::domain::LotStore;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::{init_database, SeaOrmLotStore};
use crate::infrastructure::storage::InMemoryLotStore;
use crate::interfaces::http::create_api_router;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the parking lot server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Provision the configured spots into an empty lot (default: true).
    pub seed_lot: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed_lot: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running parking lot server.
///
/// # Examples
///
/// ```rust,no_run
/// use parking_lot_service::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Allocation engine serving the API.
    pub service: Arc<ParkingLotService>,
    /// Store backing the engine.
    pub store: Arc<dyn LotStore>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub api_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Open the configured store (and run migrations for SQLite)
    /// 3. Provision the lot layout into an empty lot
    /// 4. Start the REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;
        let policy = app_cfg.policy()?;

        info!("Starting parking lot service...");

        let prometheus = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (store, db): (Arc<dyn LotStore>, Option<DatabaseConnection>) =
            match app_cfg.database.backend {
                StorageBackend::Sqlite => {
                    let db = init_database(&app_cfg.database.to_database_config()).await?;
                    if opts.auto_migrate {
                        info!("Running database migrations...");
                        Migrator::up(&db, None).await?;
                        info!("Migrations completed");
                    }
                    let store: Arc<dyn LotStore> = Arc::new(SeaOrmLotStore::new(db.clone()));
                    (store, Some(db))
                }
                StorageBackend::Memory => {
                    warn!("Using in-memory storage, lot state is lost on restart");
                    let store: Arc<dyn LotStore> = Arc::new(InMemoryLotStore::new());
                    (store, None)
                }
            };

        if opts.seed_lot {
            let created = store.provision_spots(&app_cfg.lot.layout()).await?;
            if created > 0 {
                info!(spots = created, "Lot provisioned");
            } else {
                info!("Lot already provisioned, layout left unchanged");
            }
        }

        // ── Engine ─────────────────────────────────────────────
        let service = Arc::new(
            ParkingLotService::new(store.clone(), policy)
                .with_retry(app_cfg.allocation.retry_config()),
        );

        // ── REST API server ────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let api_router = create_api_router(service.clone(), store.clone(), prometheus);

        let bind_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        let api_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            service,
            store,
            config: app_cfg,
            api_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        info!("Waiting for server tasks to complete...");
        let stopped = shutdown
            .run_with_timeout(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
            })
            .await;
        if !stopped {
            warn!("REST API server did not stop in time");
        }

        if let Some(db) = db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("Database connection closed");
            }
        }

        info!("Parking lot service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down parking lot service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Process-wide Prometheus recorder.
///
/// The global recorder can only be installed once per process, so a restart
/// within the same process reuses it. `None` if another recorder won.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus metrics disabled: {}", e);
                None
            }
        })
        .clone()
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` takes precedence over `logging.level`. Call this once at
/// process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::domain::VehicleType;

    fn memory_options() -> ServerOptions {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".to_string();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.backend = StorageBackend::Memory;
        config.lot.motorcycle_spots = 1;
        config.lot.compact_spots = 1;
        config.lot.regular_spots = 3;
        ServerOptions {
            config,
            auto_migrate: true,
            seed_lot: true,
        }
    }

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn starts_seeds_serves_and_stops() {
        let handle = ServerHandle::start(memory_options()).await.unwrap();
        assert_ne!(handle.api_addr.port(), 0);
        assert!(handle.is_running());

        assert_eq!(handle.service.remaining_spots().await.unwrap(), 5);
        handle.service.park("V1", VehicleType::Van).await.unwrap();

        let response = http_get(handle.api_addr, "/api/v1/parking-lot/remaining-spots").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"remaining_spots\":2"), "{response}");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_backend_migrates_and_seeds() {
        let mut opts = memory_options();
        opts.config.database.backend = StorageBackend::Sqlite;
        opts.config.database.url = Some("sqlite::memory:".to_string());
        opts.config.database.max_connections = 1;

        let handle = ServerHandle::start(opts).await.unwrap();
        assert_eq!(handle.service.remaining_spots().await.unwrap(), 5);
        assert!(!handle.service.is_full(VehicleType::Van).await.unwrap());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_policy_refuses_to_start() {
        let mut opts = memory_options();
        opts.config.lot.policy.push(crate::config::PolicyOverride {
            vehicle_type: VehicleType::Van,
            spots_required: 0,
            eligible: vec![],
        });
        assert!(ServerHandle::start(opts).await.is_err());
    }
}
