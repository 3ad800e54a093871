use anyhow::{bail, Result};
use clap::Parser;
use memory_insights_analytics::AnalyticsConfig;
use memory_insights_composer::{router, AppState, HttpSource, InsightComposer, MemorySource, SnapshotSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memory-insights")]
#[command(about = "Serve memory insights computed from a journal snapshot or store")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "INSIGHTS_BIND", default_value = "127.0.0.1:21956")]
    bind: String,

    /// JSON snapshot of the journal store
    #[arg(long, env = "INSIGHTS_SNAPSHOT", conflicts_with = "store_url")]
    snapshot: Option<PathBuf>,

    /// Base URL of the journal store HTTP API
    #[arg(long, env = "JOURNAL_STORE_URL")]
    store_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Memory Insights Service v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = AnalyticsConfig::from_env()?;
    info!(
        "Thresholds: count ±{:.0}%, quality ±{} pts, sphere ±{:.0}%",
        config.count_threshold_ratio * 100.0,
        config.quality_threshold_points,
        config.sphere_threshold_ratio * 100.0
    );

    let source: Arc<dyn MemorySource> = match (args.snapshot, args.store_url) {
        (Some(path), _) => Arc::new(SnapshotSource::from_path(&path)?),
        (None, Some(url)) => {
            info!("Reading journal data from {}", url);
            Arc::new(HttpSource::new(url))
        }
        (None, None) => bail!("either --snapshot or --store-url must be given"),
    };

    let state = AppState {
        composer: Arc::new(InsightComposer::new(source, config)),
    };
    let app = router(state);

    info!("Starting HTTP server on http://{}", args.bind);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
