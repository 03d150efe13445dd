mod bootstrap;
mod views;

use std::path::PathBuf;

use anyhow::{bail, Result};
use motorway_core::settings::Settings;
use motorway_core::time_utils::LocalClock;
use motorway_data::analysis::analyze_feed;
use motorway_data::reader::load_feed;
use motorway_runtime::orchestrator::{MonitoringOrchestrator, MonitoringSnapshot};
use tokio::sync::mpsc;

use crate::views::{current_report, LiveReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Motorway Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Timezone: {}, Reload: {}s, Tick: {}s",
        settings.view,
        settings.timezone,
        settings.refresh_rate,
        settings.tick_interval
    );

    let clock = LocalClock::new(&settings.timezone);
    let feed_path = resolve_feed_path(&settings);

    match settings.view.as_str() {
        "live" => {
            tracing::info!(feed = %feed_path.display(), "Starting live monitoring...");

            let orchestrator = MonitoringOrchestrator::new(
                u64::from(settings.tick_interval),
                u64::from(settings.refresh_rate),
                feed_path,
                clock,
            );
            let (rx, handle) = orchestrator.start();

            tokio::select! {
                result = run_live(rx) => {
                    handle.abort();
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; shutting down monitoring task");
                    handle.abort();
                }
            }
        }

        "report" => {
            let analysis = analyze_feed(&feed_path, clock.now());
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        "current" => {
            let now = clock.now();
            let records = load_feed(&feed_path, now);
            println!("{}", serde_json::to_string_pretty(&current_report(&records, now))?);
        }

        unknown => bail!("unknown view mode: {unknown}"),
    }

    Ok(())
}

/// `--feed` if given, else the first discovered log, else `./vehicle_log.csv`
/// (which then reads as an empty feed).
fn resolve_feed_path(settings: &Settings) -> PathBuf {
    if let Some(path) = &settings.feed {
        return path.clone();
    }
    bootstrap::discover_feed_path().unwrap_or_else(|| {
        tracing::warn!(
            "no {} found in the working directory or ~/.motorway-monitor",
            bootstrap::DEFAULT_FEED_NAME
        );
        PathBuf::from(bootstrap::DEFAULT_FEED_NAME)
    })
}

/// Print one JSON line per snapshot until the channel closes.
async fn run_live(mut rx: mpsc::Receiver<MonitoringSnapshot>) -> Result<()> {
    let mut reporter = LiveReporter::new();
    while let Some(snapshot) = rx.recv().await {
        println!("{}", reporter.report(&snapshot)?);
    }
    Ok(())
}
