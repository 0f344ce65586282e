//! Fee adapters per protocol version and chain
//!
//! Each adapter binds one subgraph deployment to a `fetch(timestamp)` and a
//! `start()` epoch. The breakdown groups them by version label and chain id,
//! the shape the aggregation framework consumes.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Deployment, Settings};
use crate::dates::DayKeys;
use crate::normalizers::{self, ProtocolVersion};
use crate::sources::defillama::ETH_COIN_ID;
use crate::sources::subgraph::{
    accumulated_fee_query, daily_fee_query, extract_entity, ACCUMULATED_FEE_ENTITY,
    DAILY_FEE_ENTITY,
};
use crate::types::*;

/// Fetches and normalizes one day of fees for one deployment
pub struct FeeAdapter {
    version: ProtocolVersion,
    chain: String,
    endpoint: String,
    start: i64,
    controller_address: String,
    oracle: Arc<dyn PriceOracle>,
    subgraph: Arc<dyn SubgraphQuery>,
}

impl FeeAdapter {
    pub fn new(
        deployment: &Deployment,
        controller_address: &str,
        oracle: Arc<dyn PriceOracle>,
        subgraph: Arc<dyn SubgraphQuery>,
    ) -> Self {
        Self {
            version: deployment.version,
            chain: deployment.chain.clone(),
            endpoint: deployment.endpoint.clone(),
            start: deployment.start,
            controller_address: controller_address.to_lowercase(),
            oracle,
            subgraph,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Epoch from which the deployment has data
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Subgraph entity id for a `YYYY-MM-DD` date
    pub fn entity_id(&self, date: &str) -> String {
        match self.version {
            ProtocolVersion::V3 => date.to_string(),
            ProtocolVersion::V320 => format!("{}-{}", self.controller_address, date),
        }
    }

    async fn query_entity<T: serde::de::DeserializeOwned>(
        &self,
        query: String,
        entity: &str,
    ) -> Result<Option<T>> {
        let data = self.subgraph.query(&self.endpoint, &query).await?;
        extract_entity(&data, entity)
    }

    /// Fees, revenue and supply-side revenue for the UTC day containing `timestamp`
    pub async fn fetch(&self, timestamp: i64) -> Result<NormalizedDailyMetrics> {
        let days = DayKeys::for_timestamp(timestamp)?;

        let price = self.oracle.price_at(ETH_COIN_ID, timestamp).await?;
        let eth_price = normalizers::price_to_big(price.price)?;
        debug!(
            "{} {}: ETH price {} from {}",
            self.version.label(),
            self.chain,
            price.price,
            price.source
        );

        let today_id = self.entity_id(&days.today);
        let yesterday_id = self.entity_id(&days.yesterday);

        let daily: Option<DailyFeeRecord> = self
            .query_entity(daily_fee_query(&today_id), DAILY_FEE_ENTITY)
            .await?;
        let accumulated_today: Option<AccumulatedProtocolFeeRecord> = self
            .query_entity(accumulated_fee_query(&today_id), ACCUMULATED_FEE_ENTITY)
            .await?;
        let accumulated_yesterday: Option<AccumulatedProtocolFeeRecord> = self
            .query_entity(accumulated_fee_query(&yesterday_id), ACCUMULATED_FEE_ENTITY)
            .await?;

        if daily.is_none() {
            debug!("No {} for {}, reporting zero fees", DAILY_FEE_ENTITY, today_id);
        }

        let figures = normalizers::normalize(
            self.version,
            daily.as_ref(),
            accumulated_today.as_ref(),
            accumulated_yesterday.as_ref(),
            &eth_price,
        );
        let metrics = figures.into_metrics(timestamp);

        info!(
            "{} {} {}: fees={:?} revenue={:?} supply_side={:?}",
            self.version.label(),
            self.chain,
            days.today,
            metrics.daily_fees,
            metrics.daily_revenue,
            metrics.daily_supply_side_revenue
        );

        Ok(metrics)
    }
}

/// Adapters keyed by version label, then chain id
pub struct BreakdownAdapter {
    breakdown: BTreeMap<String, BTreeMap<String, FeeAdapter>>,
}

impl BreakdownAdapter {
    pub fn new(
        settings: &Settings,
        oracle: Arc<dyn PriceOracle>,
        subgraph: Arc<dyn SubgraphQuery>,
    ) -> Self {
        let mut breakdown: BTreeMap<String, BTreeMap<String, FeeAdapter>> = BTreeMap::new();

        for deployment in &settings.deployments {
            let adapter = FeeAdapter::new(
                deployment,
                &settings.controller_address,
                Arc::clone(&oracle),
                Arc::clone(&subgraph),
            );
            breakdown
                .entry(deployment.version.label().to_string())
                .or_default()
                .insert(deployment.chain.to_lowercase(), adapter);
        }

        Self { breakdown }
    }

    pub fn get(&self, version: &str, chain: &str) -> Option<&FeeAdapter> {
        self.breakdown
            .get(&version.to_lowercase())?
            .get(&chain.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeeAdapter> {
        self.breakdown.values().flat_map(|chains| chains.values())
    }

    /// Fetch every adapter for the same timestamp
    pub async fn fetch_all(
        &self,
        timestamp: i64,
    ) -> Vec<(&FeeAdapter, Result<NormalizedDailyMetrics>)> {
        let adapters: Vec<&FeeAdapter> = self.iter().collect();
        let results =
            futures::future::join_all(adapters.iter().map(|a| a.fetch(timestamp))).await;
        adapters.into_iter().zip(results).collect()
    }
}
