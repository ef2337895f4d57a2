//! User roster
//!
//! A mock users REST backend (in-memory, seeded with generated users, with
//! artificial latency) and a client-side cache that keeps a cursor-paginated,
//! optimistically-updated view of one users query.

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod prefs;
pub mod search;
pub mod seed;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use store::UserStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        .route("/users", get(api::list_users))
        .route("/users", post(api::create_user))
        .route("/users", delete(api::delete_user));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
