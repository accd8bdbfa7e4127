use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleamarket_map::api::{router, ApiState};
use fleamarket_map::config::Config;
use fleamarket_map::loader::load_markets;
use fleamarket_map::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- One-time data load; nothing is served without it ---
    let (markets, stats) = load_markets(&cfg).await?;
    info!(
        "Dataset ready: {} markets from {} (season {}, {} skipped without coordinates)",
        markets.len(),
        stats.source,
        cfg.season_year,
        stats.rejected_no_coords,
    );

    // --- HTTP API ---
    let state = ApiState {
        markets: Arc::new(markets),
        source: stats.source,
        today: None,
    };
    let app = router(state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
