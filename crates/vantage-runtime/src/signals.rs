//! Startup and shutdown signalling between the concurrent units.
//!
//! Three primitives, all write-once in one direction:
//!
//! - [`ShutdownFlag`] – a shared monotonic flag. Every long-running loop
//!   polls it at most once per iteration; there is no preemptive
//!   cancellation anywhere in the system.
//! - [`ReadyLatch`] / [`ReadyWatch`] – a one-shot per-worker signal set
//!   once tracker calibration completes. It never resets.
//! - [`ReadinessBarrier`] – blocks a dependent until **all** workers have
//!   latched. The wait is indefinite by design; tests bound it via
//!   [`ReadinessBarrier::wait_all_timeout`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use vantage_types::VantageError;

// ────────────────────────────────────────────────────────────────────────────
// ShutdownFlag
// ────────────────────────────────────────────────────────────────────────────

/// Shared monotonic flag requesting cooperative termination.
///
/// Clones share the same underlying flag. The transition is
/// false → true exactly once; requesting an already-requested shutdown is
/// a no-op.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of every unit sharing this flag.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether termination has been requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ReadyLatch
// ────────────────────────────────────────────────────────────────────────────

/// Setter half of a one-shot readiness signal. Owned by exactly one
/// worker; set once calibration completes.
#[derive(Debug)]
pub struct ReadyLatch {
    tx: watch::Sender<bool>,
}

/// Observer half of a [`ReadyLatch`].
#[derive(Clone, Debug)]
pub struct ReadyWatch {
    rx: watch::Receiver<bool>,
}

impl ReadyLatch {
    /// Create an unset latch and its observer.
    pub fn new() -> (ReadyLatch, ReadyWatch) {
        let (tx, rx) = watch::channel(false);
        (ReadyLatch { tx }, ReadyWatch { rx })
    }

    /// Mark the worker ready. Setting an already-set latch is a no-op;
    /// the latch never resets.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }
}

impl ReadyWatch {
    /// Suspend until the latch is set.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readiness`] when the latch was dropped
    /// unset — the owning worker died before calibration completed.
    pub async fn wait(&mut self) -> Result<(), VantageError> {
        self.rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| {
                VantageError::Readiness("a sensor worker exited before calibrating".to_string())
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ReadinessBarrier
// ────────────────────────────────────────────────────────────────────────────

/// Blocks a dependent until every worker's latch is set.
///
/// The plain [`wait_all`][Self::wait_all] has no timeout — if a sensor
/// never finishes calibrating the caller waits forever. That limitation
/// is deliberate (startup is operator-supervised);
/// [`wait_all_timeout`][Self::wait_all_timeout] exists so automated tests
/// can bound the wait.
#[derive(Debug, Default)]
pub struct ReadinessBarrier {
    watches: Vec<ReadyWatch>,
}

impl ReadinessBarrier {
    pub fn new(watches: Vec<ReadyWatch>) -> Self {
        Self { watches }
    }

    /// Number of latches gated on.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Wait until every latch is set. Returns immediately for an empty
    /// barrier.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readiness`] when any latch was dropped
    /// unset.
    pub async fn wait_all(&mut self) -> Result<(), VantageError> {
        for watch in &mut self.watches {
            watch.wait().await?;
        }
        Ok(())
    }

    /// Like [`wait_all`][Self::wait_all] but aborts once `limit` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readiness`] on a dropped latch or when the
    /// limit elapses first.
    pub async fn wait_all_timeout(&mut self, limit: Duration) -> Result<(), VantageError> {
        tokio::time::timeout(limit, self.wait_all())
            .await
            .map_err(|_| {
                VantageError::Readiness(format!("not every sensor became ready within {limit:?}"))
            })?
    }
}
