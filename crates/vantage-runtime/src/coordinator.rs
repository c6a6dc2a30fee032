//! The fusion side of the shared detection board.
//!
//! [`FusionCoordinator`] folds the board into [`PoseEstimate`]s whenever
//! a worker publishes. It blocks on the board's change signal instead of
//! spinning, waking periodically so the shutdown flag is still observed
//! within one interval even when every sensor has gone quiet.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};
use vantage_perception::PoseFusion;
use vantage_types::{PoseEstimate, VantageError};

use crate::board::DetectionBoard;
use crate::signals::ShutdownFlag;

/// How long the board may stay quiet before the coordinator rechecks the
/// shutdown flag.
const IDLE_RECHECK: Duration = Duration::from_millis(50);

/// Merges the detection board into a stream of pose estimates.
pub struct FusionCoordinator {
    board: Arc<DetectionBoard>,
    fusion: PoseFusion,
    shutdown: ShutdownFlag,
    estimates: watch::Sender<Option<PoseEstimate>>,
}

impl FusionCoordinator {
    /// Build the coordinator plus the receiver consumers use to read the
    /// latest estimate. The channel holds `None` until the first merge
    /// with at least one detection.
    pub fn new(
        board: Arc<DetectionBoard>,
        fusion: PoseFusion,
        shutdown: ShutdownFlag,
    ) -> (Self, watch::Receiver<Option<PoseEstimate>>) {
        let (estimates, rx) = watch::channel(None);
        (
            Self {
                board,
                fusion,
                shutdown,
                estimates,
            },
            rx,
        )
    }

    /// Loop until shutdown, merging on every board change. One final
    /// merge runs after the loop so detections published in the last
    /// iteration still reach the estimate channel.
    pub async fn run(self) -> Result<(), VantageError> {
        while !self.shutdown.is_requested() {
            if tokio::time::timeout(IDLE_RECHECK, self.board.changed())
                .await
                .is_err()
            {
                // Quiet interval; recheck the flag.
                continue;
            }
            self.merge_once();
        }
        self.merge_once();
        info!("fusion coordinator shut down");
        Ok(())
    }

    /// One merge cycle: snapshot under the shared lock (bounded hold —
    /// just a clone), merge outside it, publish if anything was fused.
    fn merge_once(&self) {
        let snapshot = self.board.snapshot();
        let sources = snapshot.iter().filter(|slot| slot.is_some()).count();
        if let Some(pose) = self.fusion.merge(&snapshot) {
            debug!(
                x = pose.x,
                y = pose.y,
                heading = pose.heading_rad,
                sources,
                "pose updated"
            );
            self.estimates.send_replace(Some(PoseEstimate {
                pose,
                fused_at: Utc::now(),
                sources,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_types::{Point2, Polygon};

    fn triangle(offset: f32) -> Polygon {
        Polygon::new(vec![
            Point2::new(offset, offset),
            Point2::new(offset + 6.0, offset),
            Point2::new(offset, offset + 3.0),
        ])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn publishes_estimate_after_a_slot_write() {
        let (board, writers) = DetectionBoard::new(2);
        let shutdown = ShutdownFlag::new();
        let (coordinator, mut estimates) =
            FusionCoordinator::new(Arc::clone(&board), PoseFusion::new(), shutdown.clone());
        let handle = tokio::spawn(coordinator.run());

        writers[0].publish(triangle(0.0));
        estimates
            .wait_for(|estimate| estimate.is_some())
            .await
            .unwrap();

        let estimate = estimates.borrow().clone().unwrap();
        assert_eq!(estimate.sources, 1);
        assert!((estimate.pose.x - 2.0).abs() < 1e-5);

        shutdown.request();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn no_detections_publishes_nothing() {
        let (board, _writers) = DetectionBoard::new(2);
        let shutdown = ShutdownFlag::new();
        let (coordinator, estimates) =
            FusionCoordinator::new(board, PoseFusion::new(), shutdown.clone());

        shutdown.request();
        coordinator.run().await.unwrap();
        assert!(estimates.borrow().is_none());
    }

    /// Slots are last-write-wins with no versioning: a detection written
    /// once keeps feeding later merges even if its worker never writes
    /// again. This pins the known stale-frame behavior.
    #[tokio::test(flavor = "multi_thread")]
    async fn stale_detection_keeps_contributing() {
        let (board, writers) = DetectionBoard::new(2);
        let shutdown = ShutdownFlag::new();
        let (coordinator, mut estimates) =
            FusionCoordinator::new(Arc::clone(&board), PoseFusion::new(), shutdown.clone());
        let handle = tokio::spawn(coordinator.run());

        writers[0].publish(triangle(0.0));
        estimates
            .wait_for(|estimate| estimate.is_some())
            .await
            .unwrap();

        // A second sensor catches up; the first slot is stale but still
        // merged.
        writers[1].publish(triangle(2.0));
        estimates
            .wait_for(|estimate| {
                estimate
                    .as_ref()
                    .is_some_and(|estimate| estimate.sources == 2)
            })
            .await
            .unwrap();

        let estimate = estimates.borrow().clone().unwrap();
        // Centroids (2, 1) and (4, 3) average to (3, 2).
        assert!((estimate.pose.x - 3.0).abs() < 1e-5);
        assert!((estimate.pose.y - 2.0).abs() < 1e-5);

        shutdown.request();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn final_merge_flushes_detections_published_before_shutdown() {
        let (board, writers) = DetectionBoard::new(1);
        let shutdown = ShutdownFlag::new();
        let (coordinator, estimates) =
            FusionCoordinator::new(Arc::clone(&board), PoseFusion::new(), shutdown.clone());

        // Publish and stop before the coordinator ever runs; the final
        // merge still picks the detection up.
        writers[0].publish(triangle(0.0));
        shutdown.request();
        coordinator.run().await.unwrap();

        assert!(estimates.borrow().is_some());
    }
}
