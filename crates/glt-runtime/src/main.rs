//! glt-tracker entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config,
//! builds the feed and the overlay, and hands everything to the poller.
//! All reconciliation logic lives in `glt-reconcile`; all lifecycle
//! logic lives in the library half of this crate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use glt_config::TrackerConfig;
use glt_feed::MbtaFeed;
use glt_route::RouteOverlay;
use glt_runtime::{ConsoleSurface, MapSurface, Poller};
use glt_reconcile::MarkerSet;
use tracing::info;

/// Default map region from the original screen: Packards Corner-ish,
/// Green Line B.
const MAP_CENTER_LAT: f64 = 42.350570;
const MAP_CENTER_LON: f64 = -71.130660;

/// Green Line tracker - poll the MBTA realtime feed and reconcile train
/// markers against it.
#[derive(Parser, Debug)]
#[command(name = "glt-tracker")]
#[command(about = "Track Green Line trains from the MBTA realtime API", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a JSON config file (defaults apply when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit one JSON line per reconcile cycle instead of log lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience for MBTA_API_KEY).
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TrackerConfig::load_from_file(path)?,
        None => TrackerConfig::default(),
    };
    config.validate()?;

    let api_key = config
        .api_key()
        .context("an MBTA API key is required; see api_key_env in the config")?;

    let feed = MbtaFeed::new(
        config.api_base_url.clone(),
        api_key,
        config.route_ids.clone(),
    );

    let mut surface: Box<dyn MapSurface> = Box::new(ConsoleSurface::new(args.json));

    let overlay = load_overlay(&config)?;
    if !overlay.is_empty() {
        surface.set_overlay(&overlay);
    }

    info!(
        routes = %config.route_ids.join(","),
        interval_secs = config.poll_interval_seconds,
        lat = MAP_CENTER_LAT,
        lon = MAP_CENTER_LON,
        "tracking started"
    );

    let handle = Poller::spawn(
        Arc::new(feed),
        surface,
        MarkerSet::new(),
        Duration::from_secs(config.poll_interval_seconds),
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    let markers = handle.shutdown().await?;
    info!(tracked = markers.len(), "tracker shut down");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Load whichever overlay assets the config names. Overlay problems are
/// startup-fatal: the bundled files are fixed assets, so a parse error
/// is a packaging bug, not a runtime condition.
fn load_overlay(config: &TrackerConfig) -> anyhow::Result<RouteOverlay> {
    let mut overlay = RouteOverlay::default();

    if let Some(path) = &config.route_csv {
        overlay.polyline = glt_route::load_polyline_csv(path)
            .with_context(|| format!("load route polyline '{}'", path.display()))?;
    }
    if let Some(path) = &config.stations_csv {
        overlay.stations = glt_route::load_stations_csv(path)
            .with_context(|| format!("load stations '{}'", path.display()))?;
    }

    Ok(overlay)
}
