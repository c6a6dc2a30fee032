//! One acquisition loop per sensor link.
//!
//! A [`SensorWorker`] owns its link exclusively. Lifecycle: connect,
//! calibrate once, latch readiness, then poll → extract → publish until
//! the shared shutdown flag is observed, and finally close the link —
//! exactly once, on every exit path, abnormal ones included.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vantage_hal::{SensorConfig, SensorLink, SensorTransport};
use vantage_perception::ShapeExtractor;
use vantage_types::{Point2, VantageError};

use crate::board::SlotWriter;
use crate::signals::{ReadyLatch, ShutdownFlag};

/// Owns one sensor link and drives its acquisition loop.
pub struct SensorWorker {
    name: String,
    link: Box<dyn SensorLink>,
    register: String,
    key: String,
    extractor: Arc<dyn ShapeExtractor>,
    slot: SlotWriter,
    latch: ReadyLatch,
    shutdown: ShutdownFlag,
}

impl SensorWorker {
    /// Open the sensor link and build the worker around it.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Connection`] when the link cannot be
    /// opened. The failure is fatal to this worker only.
    #[allow(clippy::too_many_arguments)]
    pub async fn connect(
        transport: &dyn SensorTransport,
        config: &SensorConfig,
        name: impl Into<String>,
        extractor: Arc<dyn ShapeExtractor>,
        slot: SlotWriter,
        latch: ReadyLatch,
        shutdown: ShutdownFlag,
    ) -> Result<Self, VantageError> {
        let name = name.into();
        let link = transport.open(config).await?;
        info!(worker = %name, sensor = %config.name, "sensor link opened");
        Ok(Self {
            name,
            link,
            register: config.location_register.clone(),
            key: config.location_key.clone(),
            extractor,
            slot,
            latch,
            shutdown,
        })
    }

    /// Worker name, assigned by position (`worker0`, `worker1`, …).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drive the acquisition loop to completion.
    ///
    /// The link is closed exactly once before this returns, whether the
    /// loop ended normally (shutdown observed) or abnormally (calibration
    /// fault). A calibration fault also leaves the readiness latch unset,
    /// which the barrier reports to the console.
    pub async fn run(mut self) -> Result<(), VantageError> {
        let outcome = self.acquire().await;
        if let Err(err) = self.link.close().await {
            warn!(worker = %self.name, error = %err, "link close failed");
        }
        info!(worker = %self.name, "worker shut down");
        outcome
    }

    async fn acquire(&mut self) -> Result<(), VantageError> {
        self.link.calibrate().await?;
        self.latch.set();
        info!(worker = %self.name, "calibrated and ready");

        while !self.shutdown.is_requested() {
            let registers = match self.link.get_register(&self.register).await {
                Ok(map) => map,
                Err(err) => {
                    debug!(worker = %self.name, error = %err, "register poll failed; retrying next cycle");
                    continue;
                }
            };

            // A missing sub-key means the FPGA had nothing tracked this
            // cycle. Transient; retried implicitly next iteration.
            let Some(raw) = registers.get(&self.key) else {
                continue;
            };

            let contour: Vec<Point2> = raw
                .iter()
                .map(|&(x, y)| Point2::new(x as f32, y as f32))
                .collect();

            // An empty extraction never overwrites the previous detection.
            if let Some(shape) = self.extractor.extract(&contour).into_iter().next() {
                debug!(worker = %self.name, vertices = shape.vertices.len(), "detection updated");
                self.slot.publish(shape);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::DetectionBoard;
    use std::time::Duration;
    use vantage_hal::{SimReply, SimScript, SimTransport};
    use vantage_perception::TriangleExtractor;

    const MARKER: [(u32, u32); 3] = [(0, 0), (6, 0), (0, 3)];

    fn config(name: &str) -> SensorConfig {
        SensorConfig {
            name: name.to_string(),
            host: "sim".to_string(),
            port: 0,
            location_register: "ACTUAL_LOCATION".to_string(),
            location_key: "1".to_string(),
        }
    }

    async fn connect(
        transport: &SimTransport,
        slot: SlotWriter,
        latch: ReadyLatch,
        shutdown: ShutdownFlag,
    ) -> SensorWorker {
        SensorWorker::connect(
            transport,
            &config("camera0"),
            "worker0",
            Arc::new(TriangleExtractor::default()),
            slot,
            latch,
            shutdown,
        )
        .await
        .expect("sim connect must succeed")
    }

    async fn wait_for_polls(transport: &SimTransport, sensor: &str, at_least: usize) {
        let stats = transport.stats(sensor).expect("link was opened");
        while stats.polls() < at_least {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn publishes_first_extracted_shape() {
        let transport = SimTransport::new().with_script(
            "camera0",
            SimScript::new().reply(SimReply::Present(MARKER.to_vec())),
        );
        let (board, mut writers) = DetectionBoard::new(1);
        let (latch, _watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let worker = connect(&transport, writers.remove(0), latch, shutdown.clone()).await;
        let handle = tokio::spawn(worker.run());

        board.changed().await;
        shutdown.request();
        handle.await.unwrap().unwrap();

        let snapshot = board.snapshot();
        assert_eq!(snapshot[0].as_ref().unwrap().vertices.len(), 3);
        assert_eq!(transport.stats("camera0").unwrap().closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn consecutive_misses_update_nothing_and_raise_nothing() {
        let transport = SimTransport::new().with_script(
            "camera0",
            SimScript::new().replies([SimReply::Absent, SimReply::Absent, SimReply::Absent]),
        );
        let (board, mut writers) = DetectionBoard::new(1);
        let (latch, _watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let worker = connect(&transport, writers.remove(0), latch, shutdown.clone()).await;
        let handle = tokio::spawn(worker.run());

        wait_for_polls(&transport, "camera0", 3).await;
        shutdown.request();
        // The loop exits cleanly: misses are not errors.
        handle.await.unwrap().unwrap();

        assert!(board.snapshot()[0].is_none());
        assert_eq!(transport.stats("camera0").unwrap().closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_extraction_keeps_previous_detection() {
        // A valid marker first, then endless degenerate two-point blobs
        // that the extractor rejects.
        let transport = SimTransport::new().with_script(
            "camera0",
            SimScript::new().replies([
                SimReply::Present(MARKER.to_vec()),
                SimReply::Present(vec![(1, 1), (2, 2)]),
                SimReply::Present(vec![(1, 1), (2, 2)]),
            ]),
        );
        let (board, mut writers) = DetectionBoard::new(1);
        let (latch, _watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let worker = connect(&transport, writers.remove(0), latch, shutdown.clone()).await;
        let handle = tokio::spawn(worker.run());

        wait_for_polls(&transport, "camera0", 3).await;
        shutdown.request();
        handle.await.unwrap().unwrap();

        // The marker from poll 1 survived the empty extractions.
        let snapshot = board.snapshot();
        assert_eq!(snapshot[0].as_ref().unwrap().vertices.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn poll_faults_are_retried_not_fatal() {
        let transport = SimTransport::new().with_script(
            "camera0",
            SimScript::new().replies([
                SimReply::Fault("register timeout".to_string()),
                SimReply::Present(MARKER.to_vec()),
            ]),
        );
        let (board, mut writers) = DetectionBoard::new(1);
        let (latch, _watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let worker = connect(&transport, writers.remove(0), latch, shutdown.clone()).await;
        let handle = tokio::spawn(worker.run());

        board.changed().await;
        shutdown.request();
        handle.await.unwrap().unwrap();

        assert!(board.snapshot()[0].is_some());
    }

    #[tokio::test]
    async fn shutdown_already_requested_skips_the_loop() {
        let transport = SimTransport::new();
        let (_board, mut writers) = DetectionBoard::new(1);
        let (latch, mut watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();
        shutdown.request();

        let worker = connect(&transport, writers.remove(0), latch, shutdown).await;
        worker.run().await.unwrap();

        let stats = transport.stats("camera0").unwrap();
        assert_eq!(stats.polls(), 0);
        assert_eq!(stats.closes(), 1);
        // Calibration still ran and readiness was still signalled.
        watch.wait().await.unwrap();
    }

    #[tokio::test]
    async fn calibration_fault_closes_link_and_leaves_latch_unset() {
        let transport = SimTransport::new()
            .with_script("camera0", SimScript::new().fail_calibrate("tracker refused"));
        let (_board, mut writers) = DetectionBoard::new(1);
        let (latch, mut watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let worker = connect(&transport, writers.remove(0), latch, shutdown).await;
        let result = worker.run().await;
        assert!(matches!(result, Err(VantageError::Hardware { .. })));

        let stats = transport.stats("camera0").unwrap();
        assert_eq!(stats.closes(), 1);
        // The dropped latch surfaces as a readiness error downstream.
        assert!(watch.wait().await.is_err());
    }

    #[tokio::test]
    async fn failed_connection_is_fatal_to_this_worker_only() {
        let transport = SimTransport::new()
            .with_script("camera0", SimScript::new().fail_open("no route to host"));
        let (_board, mut writers) = DetectionBoard::new(1);
        let (latch, _watch) = ReadyLatch::new();
        let shutdown = ShutdownFlag::new();

        let result = SensorWorker::connect(
            &transport,
            &config("camera0"),
            "worker0",
            Arc::new(TriangleExtractor::default()),
            writers.remove(0),
            latch,
            shutdown,
        )
        .await;
        assert!(matches!(result, Err(VantageError::Connection { .. })));
    }
}
