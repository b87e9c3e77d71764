use flowscan::config::{Config, OutputFormat};
use flowscan::services::{load_into, Scanner, SequenceStore};
use flowscan::sources::FileKlineSource;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowscan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Scanning {} symbols ({:?}, {}) from {}",
        config.symbols.len(),
        config.market_mode,
        config.interval,
        config.data_dir.display()
    );

    let source = Arc::new(FileKlineSource::new(&config.data_dir, &config.interval));
    let store = SequenceStore::new();
    let summary = load_into(
        &store,
        source,
        &config.symbols,
        &config.market_mode.markets(),
        config.candle_limit,
        &config.mfi,
    )
    .await;

    if summary.loaded == 0 {
        warn!("No candle data found under {}", config.data_dir.display());
    }

    let report = Scanner::new(config.mfi.clone()).scan(&store, config.market_mode);

    match config.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Summary => print!("{}", report.summary()),
    }

    Ok(())
}
