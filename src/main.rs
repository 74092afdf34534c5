mod command;
mod config;
mod error;
mod payment;
mod session;
mod snapshot;
mod store;
mod transport;
mod web;

use anyhow::Context;
use command::CommandRelay;
use config::AppConfig;
use payment::HttpPaymentGateway;
use session::{Arbiter, SessionRegistry};
use snapshot::SnapshotStore;
use std::sync::Arc;
use store::{InMemoryTransactionStore, SledTransactionStore, TransactionStore};
use transport::HttpDeviceAdapter;
use tumbller_shared::session::SNAPSHOT_RETENTION;
use web::AppState;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // RUST_LOG wins over DEBUG
    let level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("Tumbller frame server v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Public URL: {}", config.base_url);
    info!("  Session window: {}s", config.session_duration.as_secs());

    let registry = Arc::new(SessionRegistry::new(
        config.device_ids(),
        config.session_duration,
    ));

    let mut relay = CommandRelay::new(config.device_timeout);
    for endpoint in &config.devices {
        info!(
            device_id = %endpoint.device_id,
            motor = %endpoint.base_url,
            camera = %endpoint.camera_url,
            "Rover registered"
        );
        let adapter = HttpDeviceAdapter::new(endpoint.clone(), config.device_timeout)
            .with_context(|| format!("Failed to create adapter for {}", endpoint.device_id))?;
        relay.register(endpoint.device_id.clone(), Arc::new(adapter));
    }

    let payments = Arc::new(
        HttpPaymentGateway::new(config.payment_url.clone(), config.payment_timeout)
            .context("Failed to create payment client")?,
    );

    let transactions: Arc<dyn TransactionStore> = match &config.db_path {
        Some(path) => {
            info!("  Transaction log: {}", path.display());
            Arc::new(
                SledTransactionStore::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?,
            )
        }
        None => {
            warn!("DB_PATH is empty, transactions are kept in memory only");
            Arc::new(InMemoryTransactionStore::new())
        }
    };

    let snapshots = SnapshotStore::new(
        config.static_dir.join("snapshots"),
        format!("{}/static/snapshots", config.base_url),
        SNAPSHOT_RETENTION,
    )
    .await
    .context("Failed to prepare snapshot directory")?;

    let addr = config.bind_addr();
    let state = AppState::new(
        config,
        Arbiter::new(registry),
        relay,
        payments,
        transactions,
        snapshots,
    );
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
