use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot price returned by a price oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub coin: String,            // "ethereum:0x0000..."
    pub symbol: Option<String>,  // "ETH"
    pub source: String,          // "defillama"
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub confidence: Option<f64>,
}

/// Raw `lprevenueDaily` entity. Amounts are in each asset's smallest unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFeeRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub fee0: BigDecimal,
    pub fee1: BigDecimal,
    pub premium_supply: BigDecimal,
    pub premium_borrow: BigDecimal,
    pub supply_interest0: BigDecimal,
    pub supply_interest1: BigDecimal,
    pub borrow_interest0: BigDecimal,
    pub borrow_interest1: BigDecimal,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw `accumulatedProtocolFeeDaily` entity
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatedProtocolFeeRecord {
    pub accumulated_protocol_fee0: BigDecimal,
    pub accumulated_protocol_fee1: BigDecimal,
}

/// Output handed to the aggregation framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDailyMetrics {
    pub timestamp: i64,
    pub daily_fees: Option<String>,
    pub daily_revenue: Option<String>,
    pub daily_supply_side_revenue: Option<String>,
}

/// Data source health/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    pub is_healthy: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub success_rate_24h: f64,
    pub avg_latency_ms: u64,
}

/// Error types for fee retrieval
#[derive(Debug, thiserror::Error)]
pub enum FeeAdapterError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded for {source_name}")]
    RateLimit {
        source_name: String,
        retry_after: Option<u64>,
    },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

/// Result type for fee retrieval operations
pub type Result<T> = std::result::Result<T, FeeAdapterError>;

/// Trait for spot price oracles
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    /// Price of a chain-qualified coin (e.g. `ethereum:0x...`) at a unix timestamp
    async fn price_at(&self, coin: &str, timestamp: i64) -> Result<PricePoint>;

    /// Get source health status
    async fn health(&self) -> SourceHealth;

    /// Source name
    fn name(&self) -> &str;
}

/// Trait for subgraph (GraphQL) query clients
#[async_trait::async_trait]
pub trait SubgraphQuery: Send + Sync {
    /// Run `query` against `endpoint` and return the GraphQL `data` object
    async fn query(&self, endpoint: &str, query: &str) -> Result<serde_json::Value>;
}
