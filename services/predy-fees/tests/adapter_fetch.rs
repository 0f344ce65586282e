//! End-to-end fetches against mocked oracle and subgraph servers

mod common;

use common::*;
use predy_fees::{BreakdownAdapter, DefiLlamaClient, FeeAdapterError, SubgraphClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::MockServer;

fn breakdown(oracle: &MockServer, subgraph: &MockServer) -> BreakdownAdapter {
    let settings = settings(oracle, subgraph);
    let oracle_client = Arc::new(
        DefiLlamaClient::new(settings.oracle.base_url.clone(), settings.oracle.timeout()).unwrap(),
    );
    let subgraph_client = Arc::new(SubgraphClient::new(Duration::from_secs(5)).unwrap());
    BreakdownAdapter::new(&settings, oracle_client, subgraph_client)
}

#[tokio::test]
async fn test_v3_fetch() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    mount_eth_price(&oracle, 2000.0).await;

    mount_entity(
        &subgraph,
        "lprevenueDaily",
        TODAY,
        daily_record(&[("fee0", "500000000000"), ("fee1", "3000000")]),
    )
    .await;
    mount_entity(
        &subgraph,
        "accumulatedProtocolFeeDaily",
        TODAY,
        accumulated_record("1000000000000000000", "2000000"),
    )
    .await;
    mount_entity(
        &subgraph,
        "accumulatedProtocolFeeDaily",
        YESTERDAY,
        accumulated_record("0", "0"),
    )
    .await;
    mount_empty(&subgraph).await;

    let adapters = breakdown(&oracle, &subgraph);
    let adapter = adapters.get("v3", "arbitrum").unwrap();
    assert_eq!(adapter.start(), 1671092333);

    let metrics = assert_ok!(adapter.fetch(TIMESTAMP).await);

    assert_eq!(metrics.timestamp, TIMESTAMP);
    // 5e11 * 2000 / 1e12 + 3000000
    assert_eq!(metrics.daily_fees.as_deref(), Some("3001000"));
    // 1 ETH * 2000 + 2000000
    assert_eq!(metrics.daily_revenue.as_deref(), Some("2002000"));
    assert_eq!(metrics.daily_supply_side_revenue.as_deref(), Some("999000"));
}

#[tokio::test]
async fn test_v320_fetch_uses_controller_prefixed_ids() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    mount_eth_price(&oracle, 2000.0).await;

    let today_id = format!("{}-{}", CONTROLLER, TODAY);
    let yesterday_id = format!("{}-{}", CONTROLLER, YESTERDAY);

    mount_entity(
        &subgraph,
        "lprevenueDaily",
        &today_id,
        daily_record(&[
            // 1 USDC premium, 0.5 ETH borrow interest
            ("premiumBorrow", "1000000000000000000000000"),
            ("borrowInterest1", "500000000000000000000000000000000000"),
            // 2 USDC of LP fees
            ("fee1", "2000000000000000000000000"),
        ]),
    )
    .await;
    mount_entity(
        &subgraph,
        "accumulatedProtocolFeeDaily",
        &today_id,
        accumulated_record("5000000", "100000000000000000"),
    )
    .await;
    mount_entity(
        &subgraph,
        "accumulatedProtocolFeeDaily",
        &yesterday_id,
        accumulated_record("1000000", "0"),
    )
    .await;
    mount_empty(&subgraph).await;

    let adapters = breakdown(&oracle, &subgraph);
    let adapter = adapters.get("V320", "Arbitrum").unwrap();
    assert_eq!(adapter.start(), 1678734774);
    assert_eq!(adapter.entity_id(TODAY), today_id);

    let metrics = assert_ok!(adapter.fetch(TIMESTAMP).await);

    // 1 + 0.5 * 2000
    assert_eq!(metrics.daily_fees.as_deref(), Some("1001"));
    assert_eq!(metrics.daily_supply_side_revenue.as_deref(), Some("2"));
    // 4 USDC + 0.1 ETH * 2000
    assert_eq!(metrics.daily_revenue.as_deref(), Some("204"));
}

#[tokio::test]
async fn test_missing_records_report_zero() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    mount_eth_price(&oracle, 1500.0).await;
    mount_empty(&subgraph).await;

    let adapters = breakdown(&oracle, &subgraph);
    for (adapter, result) in adapters.fetch_all(TIMESTAMP).await {
        let metrics = result.unwrap();
        assert_eq!(metrics.daily_fees.as_deref(), Some("0"), "{:?}", adapter.version());
        assert_eq!(metrics.daily_revenue.as_deref(), Some("0"));
        assert_eq!(metrics.daily_supply_side_revenue.as_deref(), Some("0"));
    }
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    mount_eth_price(&oracle, 1834.27).await;
    mount_entity(
        &subgraph,
        "lprevenueDaily",
        TODAY,
        daily_record(&[("fee0", "123456789012345"), ("supplyInterest0", "987654321")]),
    )
    .await;
    mount_empty(&subgraph).await;

    let adapters = breakdown(&oracle, &subgraph);
    let adapter = adapters.get("v3", "arbitrum").unwrap();

    let first = adapter.fetch(TIMESTAMP).await.unwrap();
    let second = adapter.fetch(TIMESTAMP).await.unwrap();
    assert_eq!(first, second);
    // 123456789012345 * 1834.27 / 1e12 + 987654321 * 1834.27 / 1e12
    assert_eq!(first.daily_fees.as_deref(), Some("226454.89600636544382"));
}

#[tokio::test]
async fn test_oracle_failure_propagates() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&oracle)
        .await;
    mount_empty(&subgraph).await;

    let adapters = breakdown(&oracle, &subgraph);
    let err = adapters
        .get("v3", "arbitrum")
        .unwrap()
        .fetch(TIMESTAMP)
        .await
        .unwrap_err();
    assert!(matches!(err, FeeAdapterError::ApiError(_)));
}

#[tokio::test]
async fn test_unknown_adapter() {
    let oracle = MockServer::start().await;
    let subgraph = MockServer::start().await;
    let adapters = breakdown(&oracle, &subgraph);

    assert!(adapters.get("v2", "arbitrum").is_none());
    assert!(adapters.get("v3", "ethereum").is_none());
    assert_eq!(adapters.iter().count(), 2);
}
