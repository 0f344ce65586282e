pub mod types;
pub mod sources {
    pub mod defillama;
    pub mod subgraph;
}
pub mod adapter;
pub mod config;
pub mod dates;
pub mod handlers;
pub mod normalizers;

pub use types::*;
pub use adapter::{BreakdownAdapter, FeeAdapter};
pub use config::Settings;
pub use normalizers::ProtocolVersion;
pub use sources::defillama::DefiLlamaClient;
pub use sources::subgraph::SubgraphClient;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
pub struct AppState {
    pub adapters: BreakdownAdapter,
    pub oracle: Arc<dyn PriceOracle>,
}

/// HTTP routes exposing the adapters to an aggregation framework
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/adapters", get(handlers::list_adapters))
        .route("/fees/:version/:chain", get(handlers::get_fees))
        .route("/health", get(handlers::health_check))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
