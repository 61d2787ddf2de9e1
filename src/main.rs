use anyhow::Context;
use clap::Parser; // for cli
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ip_tally::config::Args;
use ip_tally::expiry::ExpiryPolicy;
use ip_tally::processor::Tally;
use ip_tally::reset::DailyReset;
use ip_tally::state::AppState;
use ip_tally::store::{Persistence, RecordStore};

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    // parse cli arguments
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let persistence = if args.in_memory {
        Persistence::Memory
    } else {
        if let Some(parent) = args.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
        Persistence::JsonFile(args.data_file.clone())
    };

    // the store handle is owned here and shared by every request
    let store = Arc::new(
        RecordStore::open(persistence)
            .await
            .context("Failed to open record store")?,
    );
    let tally = Tally::new(
        store,
        ExpiryPolicy::new(args.retention()),
        DailyReset::new(args.reset_hour, args.reset_offset()?),
    );

    // spawn the background sweeper
    if let Some(period) = args.sweep_period() {
        tokio::spawn(ip_tally::maintenance::sweeper(tally.clone(), period));
    }

    let app = ip_tally::handlers::router(Arc::new(AppState::new(tally)));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Server running at http://localhost:{}", args.port);
    if args.in_memory {
        tracing::info!("Records kept in memory only");
    } else {
        tracing::info!("Records persisted to {}", args.data_file.display());
    }
    tracing::info!(
        "Retention: {} days, daily reset at {:02}:00 (UTC{})",
        args.retention_days,
        args.reset_hour,
        args.reset_offset()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
