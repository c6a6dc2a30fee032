//! Operator console: readiness gate, then the stop-token loop.
//!
//! The console is the only unit allowed to set the shutdown flag in
//! normal operation. It first blocks until every sensor has calibrated,
//! then prompts and reads operator lines; the stop token requests
//! shutdown, anything else is discarded and the prompt repeats.
//!
//! Input is any [`AsyncBufRead`], so production wires stdin while tests
//! inject in-memory readers — there is no other cancellation hook, and
//! the operator read is unbounded by design.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};
use vantage_types::VantageError;

use crate::signals::{ReadinessBarrier, ShutdownFlag};

/// Operator line that stops the session.
pub const DEFAULT_STOP_TOKEN: &str = "q";

/// Console tunables.
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Line that stops the session. Matched against trimmed input,
    /// ASCII case-insensitive.
    pub stop_token: String,
    /// Upper bound on the readiness wait. `None` — the default — waits
    /// indefinitely, a documented limitation of the startup protocol;
    /// automated tests set a bound instead.
    pub readiness_timeout: Option<Duration>,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            stop_token: DEFAULT_STOP_TOKEN.to_string(),
            readiness_timeout: None,
        }
    }
}

/// Reads operator commands once the fleet is ready.
pub struct ControlConsole<R> {
    input: R,
    barrier: ReadinessBarrier,
    shutdown: ShutdownFlag,
    options: ConsoleOptions,
}

impl<R: AsyncBufRead + Unpin + Send> ControlConsole<R> {
    pub fn new(input: R, barrier: ReadinessBarrier, shutdown: ShutdownFlag) -> Self {
        Self::with_options(input, barrier, shutdown, ConsoleOptions::default())
    }

    pub fn with_options(
        input: R,
        barrier: ReadinessBarrier,
        shutdown: ShutdownFlag,
        options: ConsoleOptions,
    ) -> Self {
        Self {
            input,
            barrier,
            shutdown,
            options,
        }
    }

    /// Block until every sensor is ready, then loop on operator input
    /// until the stop token arrives.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readiness`] when the readiness wait
    /// aborts and [`VantageError::Console`] when input cannot be read.
    /// Both failure paths request shutdown first so the rest of the
    /// session unwinds instead of hanging.
    pub async fn run(mut self) -> Result<(), VantageError> {
        if let Err(err) = self.wait_ready().await {
            warn!(error = %err, "readiness wait aborted; requesting shutdown");
            self.shutdown.request();
            return Err(err);
        }
        info!(sensors = self.barrier.len(), "all sensors calibrated and ready");

        let Self {
            input,
            shutdown,
            options,
            ..
        } = self;
        let mut lines = input.lines();

        loop {
            if shutdown.is_requested() {
                break;
            }
            // Operator-facing prompt stays on stdout; diagnostics go
            // through tracing.
            println!("Press '{}' to stop tracking...", options.stop_token);

            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().eq_ignore_ascii_case(&options.stop_token) {
                        info!("stop command received");
                        shutdown.request();
                        break;
                    }
                    debug!(input = %line.trim(), "discarding unrecognized console input");
                }
                Ok(None) => {
                    warn!("console input closed; requesting shutdown");
                    shutdown.request();
                    break;
                }
                Err(err) => {
                    shutdown.request();
                    return Err(VantageError::Console(err.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), VantageError> {
        match self.options.readiness_timeout {
            Some(limit) => self.barrier.wait_all_timeout(limit).await,
            None => self.barrier.wait_all().await,
        }
    }
}
