use std::sync::Arc;
use tracing::{error, info, Level};

use predy_fees::{AppState, BreakdownAdapter, DefiLlamaClient, Settings, SubgraphClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let settings = Settings::load()?;

    let oracle = Arc::new(DefiLlamaClient::new(
        settings.oracle.base_url.clone(),
        settings.oracle.timeout(),
    )?);
    let subgraph = Arc::new(SubgraphClient::new(settings.subgraph.timeout())?);
    let adapters = BreakdownAdapter::new(&settings, oracle.clone(), subgraph);

    // `predy-fees fetch <timestamp>` prints one day for every adapter and exits
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("fetch") {
        let timestamp = match args.get(2) {
            Some(t) => t
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("Invalid timestamp {}: {}", t, e))?,
            None => chrono::Utc::now().timestamp(),
        };
        return fetch_once(&adapters, timestamp).await;
    }

    for adapter in adapters.iter() {
        info!(
            "✓ Adapter {} {} (start {})",
            adapter.version().label(),
            adapter.chain(),
            adapter.start()
        );
    }

    let state = Arc::new(AppState { adapters, oracle });
    let app = predy_fees::router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    info!("🚀 Predy fee adapter listening on port {}", settings.port);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn fetch_once(adapters: &BreakdownAdapter, timestamp: i64) -> anyhow::Result<()> {
    let mut output = serde_json::Map::new();
    let mut failed = false;

    for (adapter, result) in adapters.fetch_all(timestamp).await {
        let key = format!("{}/{}", adapter.version().label(), adapter.chain());
        match result {
            Ok(metrics) => {
                output.insert(key, serde_json::to_value(metrics)?);
            }
            Err(e) => {
                error!("{} failed: {}", key, e);
                failed = true;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);

    if failed {
        anyhow::bail!("One or more adapters failed");
    }
    Ok(())
}
