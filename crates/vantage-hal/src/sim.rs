//! In-process simulated transport for CI and tests without physical
//! hardware.
//!
//! [`SimTransport`] implements the full gateway contract with per-sensor
//! scripted poll replies, open/calibrate failure injection, and atomic
//! lifecycle counters, so orchestration tests can assert the invariants
//! that matter (every link closed exactly once, misses never surfacing as
//! errors) without an FPGA on the bench.
//!
//! # Example
//!
//! ```rust
//! use vantage_hal::{SensorConfig, SensorLink, SensorTransport, SimReply, SimScript, SimTransport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = SimTransport::new()
//!     .with_script("camera0", SimScript::new().reply(SimReply::Present(vec![(10, 20)])));
//!
//! let config = SensorConfig {
//!     name: "camera0".to_string(),
//!     host: "sim".to_string(),
//!     port: 0,
//!     location_register: "ACTUAL_LOCATION".to_string(),
//!     location_key: "1".to_string(),
//! };
//! let mut link = transport.open(&config).await.expect("sim open must succeed");
//! let map = link.get_register("ACTUAL_LOCATION").await.expect("sim poll must succeed");
//! assert_eq!(map["1"], vec![(10, 20)]);
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use vantage_types::VantageError;

use crate::gateway::{RegisterMap, SensorConfig, SensorLink, SensorTransport};

/// Pacing applied to every simulated register poll, standing in for the
/// hardware round-trip so worker loops suspend instead of spinning.
const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(1);

// ────────────────────────────────────────────────────────────────────────────
// Scripts
// ────────────────────────────────────────────────────────────────────────────

/// One scripted register-poll reply.
#[derive(Debug, Clone)]
pub enum SimReply {
    /// The register map comes back without the location sub-key — a
    /// transient read miss, not an error.
    Absent,
    /// The register map carries these pixel pairs under the location
    /// sub-key.
    Present(Vec<(u32, u32)>),
    /// The poll itself fails with a hardware fault.
    Fault(String),
}

/// Scripted behavior for one simulated sensor.
///
/// When the reply queue runs dry the link keeps answering [`SimReply::Absent`],
/// which matches an FPGA that has lost its marker.
#[derive(Debug, Default)]
pub struct SimScript {
    replies: VecDeque<SimReply>,
    fail_open: Option<String>,
    fail_calibrate: Option<String>,
}

impl SimScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one poll reply (builder-style).
    pub fn reply(mut self, reply: SimReply) -> Self {
        self.replies.push_back(reply);
        self
    }

    /// Queue several poll replies at once.
    pub fn replies(mut self, replies: impl IntoIterator<Item = SimReply>) -> Self {
        self.replies.extend(replies);
        self
    }

    /// Make `open` fail with [`VantageError::Connection`].
    pub fn fail_open(mut self, details: impl Into<String>) -> Self {
        self.fail_open = Some(details.into());
        self
    }

    /// Make `calibrate` fail with [`VantageError::Hardware`].
    pub fn fail_calibrate(mut self, details: impl Into<String>) -> Self {
        self.fail_calibrate = Some(details.into());
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lifecycle counters
// ────────────────────────────────────────────────────────────────────────────

/// Observable lifecycle counters for one simulated link. Retained by the
/// transport so tests can assert on them after the link itself is gone.
#[derive(Debug, Default)]
pub struct LinkStats {
    polls: AtomicUsize,
    calibrations: AtomicUsize,
    closes: AtomicUsize,
}

impl LinkStats {
    /// Number of register polls issued on this link.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Number of calibration calls issued on this link.
    pub fn calibrations(&self) -> usize {
        self.calibrations.load(Ordering::SeqCst)
    }

    /// Number of close calls issued on this link.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transport
// ────────────────────────────────────────────────────────────────────────────

/// Simulated gateway. Register scripts keyed by sensor name before
/// opening; sensors without a script get an endless-miss default so a
/// worker can still run against them.
#[derive(Debug, Default)]
pub struct SimTransport {
    scripts: Mutex<HashMap<String, SimScript>>,
    stats: Mutex<HashMap<String, Arc<LinkStats>>>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a [`SimScript`] to the sensor named `sensor` (builder-style).
    pub fn with_script(self, sensor: impl Into<String>, script: SimScript) -> Self {
        self.scripts
            .lock()
            .expect("sim transport scripts lock poisoned")
            .insert(sensor.into(), script);
        self
    }

    /// Lifecycle counters for a sensor that has been opened at least once.
    pub fn stats(&self, sensor: &str) -> Option<Arc<LinkStats>> {
        self.stats
            .lock()
            .expect("sim transport stats lock poisoned")
            .get(sensor)
            .cloned()
    }
}

#[async_trait]
impl SensorTransport for SimTransport {
    async fn open(&self, config: &SensorConfig) -> Result<Box<dyn SensorLink>, VantageError> {
        let script = self
            .scripts
            .lock()
            .expect("sim transport scripts lock poisoned")
            .remove(&config.name)
            .unwrap_or_default();

        if let Some(details) = script.fail_open {
            return Err(VantageError::Connection {
                sensor: config.name.clone(),
                details,
            });
        }

        let stats = Arc::new(LinkStats::default());
        self.stats
            .lock()
            .expect("sim transport stats lock poisoned")
            .insert(config.name.clone(), Arc::clone(&stats));

        debug!(sensor = %config.name, "sim link opened");
        Ok(Box::new(SimLink {
            id: config.name.clone(),
            key: config.location_key.clone(),
            replies: script.replies,
            fail_calibrate: script.fail_calibrate,
            closed: false,
            stats,
            poll_delay: DEFAULT_POLL_DELAY,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Link
// ────────────────────────────────────────────────────────────────────────────

/// One open simulated link. Replays its script, then reports misses.
pub struct SimLink {
    id: String,
    key: String,
    replies: VecDeque<SimReply>,
    fail_calibrate: Option<String>,
    closed: bool,
    stats: Arc<LinkStats>,
    poll_delay: Duration,
}

#[async_trait]
impl SensorLink for SimLink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_register(&mut self, _name: &str) -> Result<RegisterMap, VantageError> {
        if self.closed {
            return Err(VantageError::Hardware {
                component: self.id.clone(),
                details: "register poll on a closed link".to_string(),
            });
        }
        // Stand-in for the hardware round-trip; keeps sim worker loops
        // from monopolising the executor.
        tokio::time::sleep(self.poll_delay).await;
        self.stats.polls.fetch_add(1, Ordering::SeqCst);

        match self.replies.pop_front().unwrap_or(SimReply::Absent) {
            SimReply::Absent => Ok(RegisterMap::new()),
            SimReply::Present(points) => {
                let mut map = RegisterMap::new();
                map.insert(self.key.clone(), points);
                Ok(map)
            }
            SimReply::Fault(details) => Err(VantageError::Hardware {
                component: self.id.clone(),
                details,
            }),
        }
    }

    async fn calibrate(&mut self) -> Result<(), VantageError> {
        self.stats.calibrations.fetch_add(1, Ordering::SeqCst);
        match self.fail_calibrate.take() {
            Some(details) => Err(VantageError::Hardware {
                component: self.id.clone(),
                details,
            }),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), VantageError> {
        self.closed = true;
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        debug!(sensor = %self.id, "sim link closed");
        Ok(())
    }
}
