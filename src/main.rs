// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use portflow::config::consts::MAIN_SERVICE;
use portflow::config::{load_run_config, RuntimeBuilder};
use portflow::engine::{Item, Network, PortId};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Push one JSON value per stdin line into the root input until stdin ends
/// or the network stops.
fn feed(network: &Network, input: PortId) -> usize {
    let mut pushed = 0;
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Reading stdin failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, line = %line, "Skipping input line that is not JSON");
                continue;
            }
        };
        if let Err(e) = network.port(input).push(value) {
            debug!(error = %e, "Input closed");
            break;
        }
        pushed += 1;
    }
    pushed
}

/// Print every item leaving the root output, one JSON value per line.
fn print(network: &Network, output: PortId) -> usize {
    let mut printed = 0;
    let stdout = io::stdout();
    while let Ok(item) = network.port(output).pull() {
        match item {
            Item::Value(value) => {
                let mut out = stdout.lock();
                if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
                    break;
                }
                printed += 1;
            }
            Item::Marker(marker) => debug!(marker = %marker, "Dropping marker at the root output"),
        }
    }
    printed
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <run.yaml>", args[0]);
        eprintln!("Reads one JSON value per line from stdin and prints one result per line.");
        eprintln!("Example: echo '{{\"a\": 1, \"b\": 2}}' | {} configs/add.yaml", args[0]);
        std::process::exit(1);
    }

    let start_time = Instant::now();
    let config = load_run_config(&args[1]).with_context(|| format!("loading {}", args[1]))?;
    let drain = config.runtime.get_drain_timeout();
    let runtime = RuntimeBuilder::from_config(&config).context("starting the network")?;

    let network = Arc::clone(runtime.network());
    let main = runtime
        .root()
        .service(MAIN_SERVICE)
        .context("the root operator has no main service")?;
    let (input, output) = (main.input().id(), main.output().id());
    info!(operator = %config.operator, workers = runtime.worker_count(), "🚀 Network running");

    let (done_tx, done_rx) = oneshot::channel();
    let feeder_network = Arc::clone(&network);
    std::thread::Builder::new()
        .name("portflow:stdin".to_string())
        .spawn(move || {
            let pushed = feed(&feeder_network, input);
            let _ = done_tx.send(pushed);
        })
        .context("spawning the stdin reader")?;

    let printer_network = Arc::clone(&network);
    let printer = tokio::task::spawn_blocking(move || print(&printer_network, output));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
        pushed = done_rx => {
            info!(pushed = pushed.unwrap_or(0), drain = ?drain, "Input exhausted, draining");
            tokio::time::sleep(drain).await;
        }
    }

    let failures = tokio::task::spawn_blocking(move || runtime.stop()).await?;
    let printed = printer.await?;
    info!(printed, elapsed = ?start_time.elapsed(), "🎉 Done");

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("❌ {}", failure);
        }
        bail!("{} worker(s) failed", failures.len());
    }
    Ok(())
}
