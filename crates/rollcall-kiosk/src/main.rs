//! Kiosk runner: evaluates newline-delimited JSON recognition ticks from
//! stdin and prints one attendance decision per line on stdout.
//!
//! The capture side (camera, face embedding, GPS watch) lives outside this
//! process; it feeds ticks of the form
//! `{"probe": [...], "latitude": .., "longitude": .., "accuracy_m": ..}`.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use rollcall_core::{ClassLocation, EnrolledIdentity, Evaluator};

mod config;
mod engine;

use config::Config;
use engine::Tick;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    // Load snapshots synchronously (fail-fast)
    let directory: Vec<EnrolledIdentity> = read_json(&config.directory_file)
        .with_context(|| format!("loading directory {}", config.directory_file.display()))?;
    tracing::info!(
        path = %config.directory_file.display(),
        enrolled = directory.len(),
        "identity directory loaded"
    );

    let class: ClassLocation = read_json(&config.class_file)
        .with_context(|| format!("loading class {}", config.class_file.display()))?;
    tracing::info!(
        class = %class.id,
        radius_m = class.radius_m,
        "class location loaded"
    );

    let evaluator = Evaluator::new(&config.policy);
    let handle = engine::spawn_engine(evaluator, directory, class);

    tracing::info!("rollcall-kiosk ready, reading ticks from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let tick: Tick = match serde_json::from_str(&line) {
            Ok(tick) => tick,
            Err(err) => {
                tracing::warn!(error = %err, "malformed tick, skipping");
                continue;
            }
        };

        match handle.decide(tick).await {
            Ok(decision) => println!("{}", serde_json::to_string(&decision)?),
            // A bad probe or unusable fix means nothing to decide this tick;
            // the next polling tick retries naturally.
            Err(engine::EngineError::Decision(err)) => {
                tracing::warn!(error = %err, "tick not evaluable");
            }
            Err(err @ engine::EngineError::ChannelClosed) => {
                return Err(err).context("engine stopped");
            }
        }
    }

    tracing::info!("stdin closed, rollcall-kiosk shutting down");
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
