//! REST API module.
//!
//! Contains the users routes and handlers following the front-end contract.

mod users;

pub use users::*;

use crate::AppState;

/// Sleep for the configured artificial latency.
async fn simulate_latency(state: &AppState) {
    let latency = state.config.latency;
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
