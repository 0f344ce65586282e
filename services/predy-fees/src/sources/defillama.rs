use crate::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFILLAMA_COINS_BASE: &str = "https://coins.llama.fi";

/// Chain-qualified id DefiLlama uses for native ETH
pub const ETH_COIN_ID: &str = "ethereum:0x0000000000000000000000000000000000000000";

/// Internal health tracking so health() needs no API call
struct HealthTracker {
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl HealthTracker {
    fn new() -> Self {
        Self {
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
        }
    }

    fn record_success(&self, latency_ms: u64) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_success_ms.store(now_ms, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_failure_ms.store(now_ms, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn is_healthy(&self) -> bool {
        let last_success = self.last_success_ms.load(Ordering::Relaxed);
        let last_failure = self.last_failure_ms.load(Ordering::Relaxed);

        // No traffic yet counts as healthy
        if last_success == 0 && last_failure == 0 {
            return true;
        }
        last_success > 0 && (last_failure == 0 || last_success > last_failure)
    }

    /// Mean latency over successful requests
    fn avg_latency_ms(&self) -> u64 {
        let successes = self.success_count.load(Ordering::Relaxed);
        if successes == 0 {
            return 0;
        }
        self.total_latency_ms.load(Ordering::Relaxed) / successes
    }

    fn success_rate(&self) -> f64 {
        let successes = self.success_count.load(Ordering::Relaxed);
        let failures = self.failure_count.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            return 1.0;
        }
        successes as f64 / total as f64
    }
}

/// Single coin entry of a DefiLlama price response
#[derive(Debug, Clone, Deserialize)]
pub struct CoinPrice {
    pub price: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub decimals: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    coins: HashMap<String, CoinPrice>,
}

/// DefiLlama coins API client (historical spot prices)
pub struct DefiLlamaClient {
    client: Client,
    base_url: String,
    health_tracker: HealthTracker,
}

impl DefiLlamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FeeAdapterError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_tracker: HealthTracker::new(),
        })
    }

    async fn request<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let request_start = Instant::now();
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("Fetching DefiLlama prices from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            self.health_tracker.record_failure();
            FeeAdapterError::ApiError(e.to_string())
        })?;

        let status = response.status();

        if status == 429 {
            self.health_tracker.record_failure();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(FeeAdapterError::RateLimit {
                source_name: "defillama".to_string(),
                retry_after,
            });
        }

        if !status.is_success() {
            self.health_tracker.record_failure();
            let text = response.text().await.unwrap_or_default();
            return Err(FeeAdapterError::ApiError(format!(
                "DefiLlama API error ({}): {}",
                status, text
            )));
        }

        let latency_ms = request_start.elapsed().as_millis() as u64;
        self.health_tracker.record_success(latency_ms);

        response.json::<T>().await.map_err(|e| {
            self.health_tracker.record_failure();
            FeeAdapterError::InvalidResponse(e.to_string())
        })
    }

    /// Prices for several coins at one timestamp, keyed by coin id
    pub async fn get_prices(
        &self,
        coins: &[&str],
        timestamp: i64,
    ) -> Result<HashMap<String, CoinPrice>> {
        let endpoint = format!("/prices/historical/{}/{}", timestamp, coins.join(","));
        let response: PricesResponse = self.request(&endpoint).await?;
        Ok(response.coins)
    }

    /// Spot price of one coin at `timestamp`
    pub async fn price_at(&self, coin: &str, timestamp: i64) -> Result<PricePoint> {
        let mut prices = self.get_prices(&[coin], timestamp).await?;
        let entry = prices
            .remove(coin)
            .ok_or_else(|| FeeAdapterError::AssetNotFound(coin.to_string()))?;

        // JSON numbers arrive as f64; precision beyond that is not available upstream
        let price = Decimal::try_from(entry.price)
            .map_err(|e| FeeAdapterError::InvalidResponse(e.to_string()))?;

        let timestamp = entry
            .timestamp
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .or_else(|| DateTime::from_timestamp(timestamp, 0))
            .unwrap_or_else(Utc::now);

        Ok(PricePoint {
            coin: coin.to_string(),
            symbol: entry.symbol,
            source: "defillama".to_string(),
            timestamp,
            price,
            confidence: entry.confidence,
        })
    }

    /// Health from tracked request outcomes
    pub async fn health(&self) -> SourceHealth {
        let last_success_ms = self.health_tracker.last_success_ms.load(Ordering::Relaxed);
        let last_success = if last_success_ms > 0 {
            DateTime::from_timestamp_millis(last_success_ms as i64)
        } else {
            None
        };

        let is_healthy = self.health_tracker.is_healthy();

        SourceHealth {
            source: "defillama".to_string(),
            is_healthy,
            last_success,
            last_error: if is_healthy {
                None
            } else {
                Some("Recent failures detected".to_string())
            },
            success_rate_24h: self.health_tracker.success_rate(),
            avg_latency_ms: self.health_tracker.avg_latency_ms(),
        }
    }
}

#[async_trait::async_trait]
impl PriceOracle for DefiLlamaClient {
    async fn price_at(&self, coin: &str, timestamp: i64) -> Result<PricePoint> {
        DefiLlamaClient::price_at(self, coin, timestamp).await
    }

    async fn health(&self) -> SourceHealth {
        DefiLlamaClient::health(self).await
    }

    fn name(&self) -> &str {
        "defillama"
    }
}
