//! `vantage` – multi-camera tracking orchestrator.
//!
//! Boot sequence:
//!
//! 1. Initialise structured logging (`RUST_LOG`, `VANTAGE_LOG_FORMAT=json`).
//! 2. Discover the sensor fleet: one TOML file per sensor in the config
//!    directory (first CLI argument, default `./config`), sorted so the
//!    fleet order is deterministic.
//! 3. Intercept **Ctrl-C** with a warning instead of dying — tearing a
//!    live FPGA link down outside the stop protocol can leave it needing
//!    a hardware reset. The supported exit is the stop token.
//! 4. Run the orchestrated session and log the report.
//!
//! The session runs over the simulated transport; real FPGA transports
//! plug in through the same `SensorTransport` trait without touching any
//! orchestration code.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use vantage_hal::{SensorConfig, SimReply, SimScript, SimTransport};
use vantage_perception::TriangleExtractor;
use vantage_runtime::{DEFAULT_STOP_TOKEN, Orchestrator, init_tracing};

#[tokio::main]
async fn main() {
    init_tracing();
    print_banner();

    let config_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_DIR));
    let configs = match config::discover(&config_dir) {
        Ok(configs) => configs,
        Err(err) => {
            error!(error = %err, "sensor discovery failed");
            std::process::exit(1);
        }
    };
    if configs.is_empty() {
        warn!(dir = %config_dir.display(), "no sensor configs found; running an empty fleet");
    } else {
        info!(sensors = configs.len(), dir = %config_dir.display(), "sensor fleet discovered");
    }

    // Refuse to die on Ctrl-C; steer the operator to the stop token.
    if let Err(e) = ctrlc::set_handler(|| {
        println!();
        println!(
            "{}",
            format!("Ctrl-C ignored – type '{DEFAULT_STOP_TOKEN}' to stop the session safely.")
                .yellow()
                .bold()
        );
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; abrupt exit may corrupt sensor links");
    }

    let transport = demo_transport(&configs);
    let orchestrator = Orchestrator::new(transport, Arc::new(TriangleExtractor::default()));
    let report = orchestrator
        .run(&configs, BufReader::new(tokio::io::stdin()))
        .await;

    for (worker, err) in &report.failed {
        warn!(worker = %worker, error = %err, "sensor never joined the session");
    }
    for err in &report.errors {
        warn!(error = %err, "unit error during the session");
    }
    match &report.final_estimate {
        Some(estimate) => info!(
            x = estimate.pose.x,
            y = estimate.pose.y,
            heading = estimate.pose.heading_rad,
            sources = estimate.sources,
            "final pose estimate"
        ),
        None => info!("session ended before any pose was fused"),
    }
    info!(workers = report.workers.len(), "vantage session finished");
}

/// Build the demo transport: each configured sensor gets a scripted link
/// that reports one stationary marker, offset per sensor so the fused
/// pose is visibly a blend.
fn demo_transport(configs: &[SensorConfig]) -> Arc<SimTransport> {
    let mut transport = SimTransport::new();
    for (index, config) in configs.iter().enumerate() {
        let o = (index as u32) * 10;
        transport = transport.with_script(
            &config.name,
            SimScript::new().replies([
                SimReply::Present(vec![(o, o), (o + 6, o), (o, o + 3)]),
                SimReply::Present(vec![(o, o), (o + 6, o), (o, o + 3)]),
            ]),
        );
    }
    Arc::new(transport)
}

fn print_banner() {
    println!("{}", "VANTAGE".bold().cyan());
    println!("{}", "Multi-camera tracking orchestrator".dimmed());
    println!();
}
