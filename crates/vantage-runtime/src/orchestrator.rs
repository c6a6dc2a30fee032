//! Session wiring: N sensor workers + fusion + console, started together
//! and joined together.
//!
//! The orchestrator owns no loop of its own. It opens every configured
//! link in order, builds the shared state, spawns the N+2 concurrent
//! units as tokio tasks, and then joins every task before reporting —
//! the join completing is what guarantees every sensor link has been
//! closed.

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::{Instrument, error, info, info_span};
use vantage_hal::{SensorConfig, SensorTransport};
use vantage_perception::{PoseFusion, ShapeExtractor};
use vantage_types::{PoseEstimate, VantageError};

use crate::board::DetectionBoard;
use crate::console::{ConsoleOptions, ControlConsole};
use crate::coordinator::FusionCoordinator;
use crate::signals::{ReadinessBarrier, ReadyLatch, ShutdownFlag};
use crate::worker::SensorWorker;

/// Outcome of a completed tracking session. By the time a report exists,
/// every concurrent unit has been joined.
#[derive(Debug)]
pub struct SessionReport {
    /// Names of the workers that ran, in construction order.
    pub workers: Vec<String>,
    /// Workers whose link could not be opened. A connection failure is
    /// isolated: it never stops the rest of the fleet.
    pub failed: Vec<(String, VantageError)>,
    /// Errors surfaced by units during the run (calibration faults,
    /// readiness aborts, input failures, panics).
    pub errors: Vec<VantageError>,
    /// The last pose estimate published before teardown, if any.
    pub final_estimate: Option<PoseEstimate>,
}

/// Builds and runs one tracking session.
pub struct Orchestrator {
    transport: Arc<dyn SensorTransport>,
    extractor: Arc<dyn ShapeExtractor>,
    console_options: ConsoleOptions,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn SensorTransport>, extractor: Arc<dyn ShapeExtractor>) -> Self {
        Self {
            transport,
            extractor,
            console_options: ConsoleOptions::default(),
        }
    }

    /// Override the console tunables (builder-style).
    pub fn with_console_options(mut self, options: ConsoleOptions) -> Self {
        self.console_options = options;
        self
    }

    /// Run one full session over `configs`, in the given order, reading
    /// operator commands from `console_input`.
    ///
    /// One worker and one readiness latch are created per config, named
    /// deterministically by position (`worker0`, `worker1`, …). All units
    /// share a single shutdown flag; the session returns only after every
    /// unit has been joined.
    pub async fn run<R>(&self, configs: &[SensorConfig], console_input: R) -> SessionReport
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let shutdown = ShutdownFlag::new();
        let (board, writers) = DetectionBoard::new(configs.len());

        // Open links in config order. A failed open excludes that worker
        // (and its latch) from the session; everyone else still runs.
        let mut workers = Vec::new();
        let mut watches = Vec::new();
        let mut failed = Vec::new();
        for ((index, config), slot) in configs.iter().enumerate().zip(writers) {
            let name = format!("worker{index}");
            let (latch, watch) = ReadyLatch::new();
            match SensorWorker::connect(
                self.transport.as_ref(),
                config,
                &name,
                Arc::clone(&self.extractor),
                slot,
                latch,
                shutdown.clone(),
            )
            .await
            {
                Ok(worker) => {
                    workers.push(worker);
                    watches.push(watch);
                }
                Err(err) => {
                    error!(worker = %name, error = %err, "sensor connection failed; continuing without it");
                    failed.push((name, err));
                }
            }
        }

        let (coordinator, estimates) = FusionCoordinator::new(
            Arc::clone(&board),
            PoseFusion::new(),
            shutdown.clone(),
        );
        let console = ControlConsole::with_options(
            console_input,
            ReadinessBarrier::new(watches),
            shutdown.clone(),
            self.console_options.clone(),
        );

        let mut worker_names = Vec::new();
        let mut handles = Vec::new();
        for worker in workers {
            let name = worker.name().to_string();
            let span = info_span!("unit", name = %name);
            worker_names.push(name);
            handles.push(tokio::spawn(worker.run().instrument(span)));
        }
        handles.push(tokio::spawn(
            coordinator.run().instrument(info_span!("unit", name = "fusion")),
        ));
        handles.push(tokio::spawn(
            console.run().instrument(info_span!("unit", name = "console")),
        ));

        // Join every unit before reporting. Worker run() closes its link
        // on every exit path, so a completed join means no link is left
        // open.
        let mut errors = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => errors.push(err),
                Err(err) => errors.push(VantageError::Join(err.to_string())),
            }
        }

        let final_estimate = estimates.borrow().clone();
        info!(
            workers = worker_names.len(),
            failed = failed.len(),
            errors = errors.len(),
            "session complete; all units joined"
        );
        SessionReport {
            workers: worker_names,
            failed,
            errors,
            final_estimate,
        }
    }
}
