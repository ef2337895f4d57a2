//! Roster mock backend server.
//!
//! Serves the users REST API over an in-memory, generated user set.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use user_roster::config::Config;
use user_roster::store::UserStore;
use user_roster::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting roster mock backend");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Artificial latency: {:?}", config.latency);

    // Seed the user store
    let store = Arc::new(UserStore::seeded(config.seed_count, config.seed));
    tracing::info!("User store seeded with {} users", store.len().await);

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
