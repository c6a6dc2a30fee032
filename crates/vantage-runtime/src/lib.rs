//! `vantage-runtime` – The acquisition and fusion concurrency core.
//!
//! Coordinates N independent sensor acquisition loops: synchronized
//! startup, a shared detection board, pose fusion, and cooperative
//! teardown on the operator's stop command.
//!
//! # Modules
//!
//! - [`signals`] – [`ShutdownFlag`][signals::ShutdownFlag] (shared
//!   monotonic termination request), [`ReadyLatch`][signals::ReadyLatch]
//!   (one-shot per-worker readiness), and
//!   [`ReadinessBarrier`][signals::ReadinessBarrier] (wait-for-all gate).
//! - [`board`] – [`DetectionBoard`][board::DetectionBoard]: the shared
//!   per-sensor detection slots, single-writer-per-slot by construction.
//! - [`worker`] – [`SensorWorker`][worker::SensorWorker]: one acquisition
//!   loop per sensor link (calibrate, signal readiness, poll, extract,
//!   publish, close).
//! - [`coordinator`] – [`FusionCoordinator`][coordinator::FusionCoordinator]:
//!   merges the board into [`PoseEstimate`][vantage_types::PoseEstimate]s
//!   whenever a worker publishes.
//! - [`console`] – [`ControlConsole`][console::ControlConsole]: gates on
//!   readiness, then turns the operator's stop token into a shutdown
//!   request.
//! - [`orchestrator`] – [`Orchestrator`][orchestrator::Orchestrator]:
//!   wires everything together, starts the N+2 concurrent units, and
//!   joins them all before reporting.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: one-shot
//!   process-wide `tracing` subscriber setup for binaries.

pub mod board;
pub mod console;
pub mod coordinator;
pub mod orchestrator;
pub mod signals;
pub mod telemetry;
pub mod worker;

pub use board::{DetectionBoard, SlotWriter};
pub use console::{ConsoleOptions, ControlConsole, DEFAULT_STOP_TOKEN};
pub use coordinator::FusionCoordinator;
pub use orchestrator::{Orchestrator, SessionReport};
pub use signals::{ReadinessBarrier, ReadyLatch, ReadyWatch, ShutdownFlag};
pub use telemetry::init_tracing;
pub use worker::SensorWorker;
