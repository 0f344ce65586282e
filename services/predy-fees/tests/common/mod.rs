//! Shared wiremock fixtures for the oracle and subgraph

#![allow(dead_code)]

use predy_fees::Settings;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CONTROLLER: &str = "0x68a154fb3e8ff6e4da10ecd54def25d9149ddbde";

/// 2023-03-13T19:12:54Z
pub const TIMESTAMP: i64 = 1678734774;
pub const TODAY: &str = "2023-03-13";
pub const YESTERDAY: &str = "2023-03-12";

/// Settings pointing both deployments and the oracle at mock servers
pub fn settings(oracle: &MockServer, subgraph: &MockServer) -> Settings {
    Settings::from_toml(&format!(
        r#"
[oracle]
base_url = "{oracle}"
timeout_secs = 5

[subgraph]
timeout_secs = 5

[[deployments]]
version = "v3"
chain = "arbitrum"
endpoint = "{subgraph}/v3"
start = 1671092333

[[deployments]]
version = "v320"
chain = "arbitrum"
endpoint = "{subgraph}/v320"
start = 1678734774
"#,
        oracle = oracle.uri(),
        subgraph = subgraph.uri(),
    ))
    .expect("test settings")
}

pub async fn mount_eth_price(server: &MockServer, price: f64) {
    let mut coins = serde_json::Map::new();
    coins.insert(
        predy_fees::sources::defillama::ETH_COIN_ID.to_string(),
        json!({ "price": price, "symbol": "ETH", "timestamp": TIMESTAMP, "confidence": 0.99 }),
    );
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "coins": coins })))
        .mount(server)
        .await;
}

pub fn daily_record(fields: &[(&str, &str)]) -> Value {
    let mut record = json!({
        "id": "x",
        "fee0": "0",
        "fee1": "0",
        "premiumSupply": "0",
        "premiumBorrow": "0",
        "supplyInterest0": "0",
        "supplyInterest1": "0",
        "borrowInterest0": "0",
        "borrowInterest1": "0",
        "updatedAt": "1678734000"
    });
    for (k, v) in fields {
        record[*k] = json!(v);
    }
    record
}

pub fn accumulated_record(fee0: &str, fee1: &str) -> Value {
    json!({ "accumulatedProtocolFee0": fee0, "accumulatedProtocolFee1": fee1 })
}

/// Answer `entity(id: "<id>")` queries with `record`
pub async fn mount_entity(server: &MockServer, entity: &str, id: &str, record: Value) {
    let mut data = serde_json::Map::new();
    data.insert(entity.to_string(), record);
    Mock::given(method("POST"))
        .and(body_string_contains(format!("{}(id: \\\"{}\\\")", entity, id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

/// Fallback: every other query finds no entity
pub async fn mount_empty(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .with_priority(10)
        .mount(server)
        .await;
}
