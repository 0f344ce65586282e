use crate::types::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// GraphQL-over-HTTP client for subgraph endpoints
#[derive(Clone)]
pub struct SubgraphClient {
    client: Client,
}

impl SubgraphClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeeAdapterError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn query(&self, endpoint: &str, query: &str) -> Result<serde_json::Value> {
        debug!("Querying subgraph {}", endpoint);

        let response = self
            .client
            .post(endpoint)
            .json(&GraphQlRequest { query })
            .send()
            .await
            .map_err(|e| FeeAdapterError::ApiError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FeeAdapterError::ApiError(format!(
                "Subgraph error ({}): {}",
                status, text
            )));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| FeeAdapterError::InvalidResponse(e.to_string()))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(FeeAdapterError::GraphQl(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| FeeAdapterError::InvalidResponse("Missing data field".to_string()))
    }
}

#[async_trait::async_trait]
impl SubgraphQuery for SubgraphClient {
    async fn query(&self, endpoint: &str, query: &str) -> Result<serde_json::Value> {
        SubgraphClient::query(self, endpoint, query).await
    }
}

pub const DAILY_FEE_ENTITY: &str = "lprevenueDaily";
pub const ACCUMULATED_FEE_ENTITY: &str = "accumulatedProtocolFeeDaily";

pub fn daily_fee_query(entity_id: &str) -> String {
    format!(
        r#"{{
  {DAILY_FEE_ENTITY}(id: "{entity_id}") {{
    id
    fee0
    fee1
    premiumSupply
    premiumBorrow
    supplyInterest0
    supplyInterest1
    borrowInterest0
    borrowInterest1
    updatedAt
  }}
}}"#
    )
}

pub fn accumulated_fee_query(entity_id: &str) -> String {
    format!(
        r#"{{
  {ACCUMULATED_FEE_ENTITY}(id: "{entity_id}") {{
    accumulatedProtocolFee0
    accumulatedProtocolFee1
  }}
}}"#
    )
}

/// Pull one entity out of a `data` object. Absent or null means no record.
pub fn extract_entity<T: DeserializeOwned>(data: &serde_json::Value, key: &str) -> Result<Option<T>> {
    match data.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| FeeAdapterError::InvalidResponse(format!("{}: {}", key, e))),
    }
}
