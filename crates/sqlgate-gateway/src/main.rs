//! sqlgate HTTP/JSON gateway binary.

use std::sync::Arc;

use clap::Parser;
use sqlgate_core::{Executor, PolicyStore, SecureDataService, ServiceOptions};
use sqlgate_gateway::{create_router, AppState, Args, GatewayConfig, MySqlExecutor};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line args
    let args = Args::parse();
    let config = GatewayConfig::from(&args);

    info!(
        listen = %config.listen_addr,
        legacy_where = %config.legacy_where,
        "Starting sqlgate gateway"
    );

    if config.pool_min_connections > config.pool_max_connections {
        anyhow::bail!("pool_min_connections cannot exceed pool_max_connections");
    }

    // Load the policy once; it is never mutated afterwards
    let policy = match &config.policy_file {
        Some(path) => {
            let policy = PolicyStore::from_json_file(path)?;
            info!(path = %path.display(), roles = policy.roles().len(), "Loaded policy file");
            policy
        }
        None => {
            info!("No policy file given, using built-in policy");
            PolicyStore::builtin()
        }
    };
    if config.expose_error_details {
        warn!("Database error details will be included in responses");
    }

    // Connect to MySQL
    let executor = MySqlExecutor::connect(&config).await?;
    info!(
        min_connections = config.pool_min_connections,
        max_connections = config.pool_max_connections,
        request_timeout_ms = config.request_timeout.as_millis(),
        "Connected to database"
    );

    let executor: Arc<dyn Executor> = Arc::new(executor);
    let options = ServiceOptions::default().with_legacy_where(config.legacy_where);
    let service = SecureDataService::new(Arc::new(policy), executor, options);

    // Create application state and router
    let state = AppState::new(service, config.clone());
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
