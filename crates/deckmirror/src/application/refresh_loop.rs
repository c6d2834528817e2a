//! The paced refresh loop that repaints every key display.
//!
//! One loop iteration (a *tick*) captures, encodes, and pushes one
//! image per key, then sleeps whatever remains of the frame budget
//! `1 / rate`.  The budget is recomputed from [`SharedRate`] on every
//! iteration, so a rate change from the key dispatcher takes effect on
//! the very next tick without restarting the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use deckmirror_core::{RegionTable, SharedRate};

use crate::infrastructure::deck::SharedDeck;

use super::produce_frames::FrameProducer;

/// Drives the periodic repaint of all key displays.
pub struct RefreshController {
    deck: SharedDeck,
    producer: FrameProducer,
    regions: Arc<RegionTable>,
    rate: Arc<SharedRate>,
    running: Arc<AtomicBool>,
}

impl RefreshController {
    pub fn new(
        deck: SharedDeck,
        producer: FrameProducer,
        regions: Arc<RegionTable>,
        rate: Arc<SharedRate>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self { deck, producer, regions, rate, running }
    }

    /// Handle that makes the loop exit after the current tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Time one whole iteration may take at the current rate.
    ///
    /// Reads the shared rate cell on every call; this is what makes a
    /// rate change apply to the very next iteration.
    fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate.get())
    }

    /// Repaints every key once.
    ///
    /// The deck mutex is held for the whole batch, so the key-event
    /// pump can never interleave its HID traffic between two image
    /// pushes of the same tick.  A failed capture or push skips that
    /// key (its display keeps the previous image) and never aborts the
    /// batch.
    pub fn tick(&self) {
        let mut deck = self.deck.lock().expect("deck mutex poisoned");

        for (key, region) in self.regions.iter() {
            let image = match self.producer.capture_key(region) {
                Ok(image) => image,
                Err(e) => {
                    debug!(key, error = %e, "capture failed, keeping previous image");
                    continue;
                }
            };
            if let Err(e) = deck.set_key_image(key as u8, &image) {
                warn!(key, error = %e, "image push failed");
            }
        }
    }

    /// Runs ticks until the stop handle flips.
    ///
    /// When a tick overruns its budget the loop proceeds immediately;
    /// there is no catch-up, so a slow tick lowers the effective rate
    /// instead of queueing work.
    pub async fn run(&self) {
        debug!(rate = self.rate.get(), keys = self.regions.len(), "refresh loop started");

        while self.running.load(Ordering::Relaxed) {
            let start = Instant::now();
            self.tick();

            let budget = self.frame_budget();
            let elapsed = start.elapsed();
            if let Some(remaining) = budget.checked_sub(elapsed) {
                tokio::time::sleep(remaining).await;
            } else {
                trace!(?elapsed, ?budget, "tick overran its frame budget");
                // Let other tasks run even when permanently overrunning.
                tokio::task::yield_now().await;
            }
        }

        debug!("refresh loop stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capture::mock::MockGrabber;
    use crate::infrastructure::capture::ScreenGrabber;
    use crate::infrastructure::deck::mock::MockDeck;
    use crate::infrastructure::deck::DeckDevice;

    fn controller_with(deck: &MockDeck, grabber: &MockGrabber) -> RefreshController {
        let format = deck.key_image_format();
        let (width, height) = grabber.screen_size().expect("mock size");
        let regions = Arc::new(RegionTable::build(width, height, deck.key_count() as usize));
        RefreshController::new(
            Arc::new(std::sync::Mutex::new(deck.clone())),
            FrameProducer::new(Arc::new(grabber.clone()), format),
            regions,
            Arc::new(SharedRate::new(10.0)),
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[test]
    fn test_tick_pushes_one_image_per_key() {
        // Arrange
        let deck = MockDeck::new();
        let grabber = MockGrabber::new(1920, 1080);
        let controller = controller_with(&deck, &grabber);

        // Act
        controller.tick();

        // Assert: 15 pushes, addressed to keys 0..15 in order.
        let images = deck.pushed_images();
        assert_eq!(images.len(), 15);
        let keys: Vec<u8> = images.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..15).collect::<Vec<u8>>());
        assert!(images.iter().all(|(_, len)| *len > 0));
    }

    #[test]
    fn test_tick_skips_keys_whose_capture_fails() {
        // Arrange: key 0's region fails to grab.
        let deck = MockDeck::new();
        let grabber = MockGrabber::new(1920, 1080);
        let controller = controller_with(&deck, &grabber);
        grabber.fail_region(*controller.regions.get(0).expect("table has key 0"));

        // Act
        controller.tick();

        // Assert: the other 14 keys still got painted.
        let images = deck.pushed_images();
        assert_eq!(images.len(), 14);
        assert!(images.iter().all(|(k, _)| *k != 0));
    }

    #[test]
    fn test_tick_survives_image_push_failure() {
        let deck = MockDeck::new();
        deck.fail_images_for_key(7);
        let grabber = MockGrabber::new(1920, 1080);
        let controller = controller_with(&deck, &grabber);

        controller.tick();

        assert_eq!(deck.pushed_images().len(), 14);
    }

    #[tokio::test]
    async fn test_run_exits_after_stop_handle_flips() {
        let deck = MockDeck::new();
        let grabber = MockGrabber::new(1920, 1080);
        let controller = controller_with(&deck, &grabber);
        let stop = controller.stop_handle();

        let task = tokio::spawn(async move { controller.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.store(false, Ordering::Relaxed);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("loop must exit promptly after stop")
            .expect("loop task must not panic");
        assert!(!deck.pushed_images().is_empty(), "at least one tick must have run");
    }

    #[test]
    fn test_frame_budget_follows_the_rate_cell() {
        // Arrange: the helper starts at 10 FPS (100 ms budget).
        let deck = MockDeck::new();
        let grabber = MockGrabber::new(1920, 1080);
        let controller = controller_with(&deck, &grabber);
        assert_eq!(controller.frame_budget(), Duration::from_millis(100));

        // Act: a rate change lands in the shared cell.
        controller.rate.set(100.0).expect("valid rate");

        // Assert: the very next budget computation reflects it; no loop
        // restart or re-read of anything else is needed.
        assert_eq!(controller.frame_budget(), Duration::from_millis(10));

        controller.rate.cycle();
        assert_eq!(controller.frame_budget(), Duration::from_millis(200));
    }
}
