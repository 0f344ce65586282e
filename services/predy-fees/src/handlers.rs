use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::types::{NormalizedDailyMetrics, SourceHealth};
use crate::AppState;

/// Query params for the fees endpoint
#[derive(Debug, serde::Deserialize)]
pub struct FeesQuery {
    /// Unix seconds; defaults to now
    timestamp: Option<i64>,
}

/// GET /fees/:version/:chain?timestamp=N - daily metrics for one deployment
pub async fn get_fees(
    State(state): State<Arc<AppState>>,
    Path((version, chain)): Path<(String, String)>,
    Query(query): Query<FeesQuery>,
) -> Result<Json<NormalizedDailyMetrics>, (StatusCode, String)> {
    let adapter = state.adapters.get(&version, &chain).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("No adapter for {}/{}", version, chain),
        )
    })?;

    let timestamp = query
        .timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    if timestamp < adapter.start() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "{}/{} has no data before {}",
                version,
                chain,
                adapter.start()
            ),
        ));
    }

    info!("Fetching fees for {}/{} at {}", version, chain, timestamp);

    match adapter.fetch(timestamp).await {
        Ok(metrics) => Ok(Json(metrics)),
        Err(e) => {
            warn!("Fetch failed for {}/{}: {}", version, chain, e);
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// GET /adapters - versions, chains and start epochs
pub async fn list_adapters(State(state): State<Arc<AppState>>) -> Json<Vec<AdapterInfo>> {
    Json(
        state
            .adapters
            .iter()
            .map(|a| AdapterInfo {
                version: a.version().label().to_string(),
                chain: a.chain().to_string(),
                start: a.start(),
            })
            .collect(),
    )
}

/// GET /health - Service health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let oracle = state.oracle.health().await;

    Json(HealthResponse {
        status: if oracle.is_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        sources: vec![oracle],
    })
}

// Response types
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AdapterInfo {
    pub version: String,
    pub chain: String,
    pub start: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sources: Vec<SourceHealth>,
}
