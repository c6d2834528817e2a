//! Monitor lifecycle orchestration.
//!
//! [`MonitorService`] owns the whole session: it validates and prepares
//! the deck, builds the region table for the current screen, then runs
//! two concurrent contexts against the shared deck handle:
//!
//! - the **refresh loop** ([`RefreshController`]) repainting every key
//!   at the current rate, and
//! - the **event pump**, a blocking task that polls the deck for key
//!   state changes and feeds them to the [`InputDispatcher`].
//!
//! The lifecycle is strictly `Idle → Running → Stopped`; a stopped
//! service is never restarted (open a new one instead), and `stop` is
//! safe to call any number of times.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use deckmirror_core::{RegionTable, SharedRate};

use crate::infrastructure::capture::{CaptureError, ScreenGrabber};
use crate::infrastructure::deck::{DeckError, SharedDeck};
use crate::infrastructure::pointer::PointerController;
use crate::infrastructure::storage::AppConfig;

use super::dispatch_keys::InputDispatcher;
use super::produce_frames::FrameProducer;
use super::refresh_loop::RefreshController;

/// How often the event pump polls the deck for key-state changes.
const PUMP_INTERVAL: Duration = Duration::from_millis(15);

/// Upper bound on waiting for the background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Error type for monitor lifecycle operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `start` was called on a service that already ran.
    #[error("monitor can only be started once, from idle (currently {0:?})")]
    NotIdle(MonitorState),

    /// Preparing the deck failed.
    #[error("deck setup failed: {0}")]
    Setup(#[from] DeckError),

    /// The screen size could not be determined.
    #[error("screen setup failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Lifecycle states of a [`MonitorService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Constructed, not yet started.
    Idle,
    /// Background tasks are live.
    Running,
    /// Terminal: the deck has been reset and released.
    Stopped,
}

/// Owns and orchestrates one mirroring session.
pub struct MonitorService {
    deck: SharedDeck,
    grabber: Arc<dyn ScreenGrabber>,
    pointer: Option<Arc<dyn PointerController>>,
    config: AppConfig,
    state: MonitorState,
    running: Arc<AtomicBool>,
    rate: Arc<SharedRate>,
    refresh_task: Option<JoinHandle<()>>,
    pump_task: Option<JoinHandle<()>>,
}

impl MonitorService {
    pub fn new(
        deck: SharedDeck,
        grabber: Arc<dyn ScreenGrabber>,
        pointer: Option<Arc<dyn PointerController>>,
        config: AppConfig,
    ) -> Self {
        let rate = Arc::new(SharedRate::new(config.mirror.effective_fps()));
        Self {
            deck,
            grabber,
            pointer,
            config,
            state: MonitorState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            rate,
            refresh_task: None,
            pump_task: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Prepares the deck and spawns the refresh loop and event pump.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::NotIdle`] when called more than once.
    /// - [`MonitorError::Setup`] when the deck has no key displays or
    ///   its preparation (reset, brightness) fails.
    /// - [`MonitorError::Capture`] when the screen size is unavailable.
    pub async fn start(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Idle {
            return Err(MonitorError::NotIdle(self.state));
        }

        // Prepare the deck under one guard: nothing else touches it yet.
        let (key_count, format) = {
            let mut deck = self.deck.lock().expect("deck mutex poisoned");
            if !deck.is_visual() {
                return Err(MonitorError::Setup(DeckError::NotVisual(
                    deck.model_name().to_string(),
                )));
            }

            info!(
                model = deck.model_name(),
                serial = deck.serial_number(),
                keys = deck.key_count(),
                layout = ?deck.key_layout(),
                "deck opened"
            );

            deck.reset()?;
            deck.set_brightness(self.config.mirror.effective_brightness())?;
            (deck.key_count(), deck.key_image_format())
        };

        let (screen_width, screen_height) = self.grabber.screen_size()?;
        let regions = Arc::new(RegionTable::build(
            screen_width,
            screen_height,
            key_count as usize,
        ));
        info!(screen_width, screen_height, keys = key_count, "region table built");
        for (key, rect) in regions.iter() {
            debug!(key, x1 = rect.x1, y1 = rect.y1, x2 = rect.x2, y2 = rect.y2, "key region");
        }

        self.running.store(true, Ordering::Relaxed);

        let controller = RefreshController::new(
            Arc::clone(&self.deck),
            FrameProducer::new(Arc::clone(&self.grabber), format),
            Arc::clone(&regions),
            Arc::clone(&self.rate),
            Arc::clone(&self.running),
        );
        self.refresh_task = Some(tokio::spawn(async move { controller.run().await }));

        let dispatcher = InputDispatcher::new(
            regions,
            Arc::clone(&self.rate),
            self.pointer.clone(),
            Duration::from_millis(self.config.pointer.move_duration_ms),
            Duration::from_millis(self.config.pointer.pre_click_delay_ms),
        );
        let deck = Arc::clone(&self.deck);
        let running = Arc::clone(&self.running);
        self.pump_task = Some(tokio::task::spawn_blocking(move || {
            pump_events(deck, running, dispatcher);
        }));

        self.state = MonitorState::Running;
        info!(rate = self.rate.get(), "monitor running");
        info!("key 0 cycles the refresh rate; any other key clicks its screen region");
        Ok(())
    }

    /// Stops the background tasks and releases the deck.
    ///
    /// Never fails and may be called any number of times, from any
    /// state; the device teardown (reset + close) runs on every call,
    /// with failures logged and swallowed.  Waits at most
    /// [`SHUTDOWN_TIMEOUT`] per background task.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        for (name, task) in [
            ("refresh loop", self.refresh_task.take()),
            ("event pump", self.pump_task.take()),
        ] {
            let Some(task) = task else { continue };
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => debug!(task = name, "task finished"),
                Ok(Err(e)) => error!(task = name, error = %e, "task panicked"),
                Err(_) => warn!(task = name, "task did not finish within shutdown timeout"),
            }
        }

        // Leave the deck blank rather than frozen on the last frame.
        {
            let mut deck = self.deck.lock().expect("deck mutex poisoned");
            if let Err(e) = deck.reset() {
                warn!(error = %e, "deck reset on shutdown failed");
            }
            if let Err(e) = deck.close() {
                warn!(error = %e, "deck close failed");
            }
        }

        self.state = MonitorState::Stopped;
        info!("monitor stopped");
    }

    /// Runs the full session: start, block until Ctrl-C, stop.
    ///
    /// # Errors
    ///
    /// Propagates [`start`](Self::start) failures; shutdown itself
    /// never fails.
    pub async fn run(&mut self) -> Result<(), MonitorError> {
        self.start().await?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        } else {
            info!("shutdown signal received");
        }

        self.stop().await;
        Ok(())
    }
}

/// Body of the event pump task.
///
/// Each iteration takes the deck guard only long enough to drain
/// pending key events, then dispatches them with the guard released, so
/// a click's settle delays never block the refresh loop's image pushes.
fn pump_events(deck: SharedDeck, running: Arc<AtomicBool>, dispatcher: InputDispatcher) {
    debug!("event pump started");
    while running.load(Ordering::Relaxed) {
        let events = {
            let mut deck = deck.lock().expect("deck mutex poisoned");
            match deck.poll_key_events() {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "key-event poll failed");
                    Vec::new()
                }
            }
        };

        for event in events {
            dispatcher.on_key_event(event);
        }

        std::thread::sleep(PUMP_INTERVAL);
    }
    debug!("event pump stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capture::mock::MockGrabber;
    use crate::infrastructure::deck::mock::MockDeck;
    use crate::infrastructure::deck::KeyEvent;
    use crate::infrastructure::pointer::mock::{MockPointer, PointerCall};

    fn service(deck: &MockDeck, pointer: Option<MockPointer>) -> MonitorService {
        let mut config = AppConfig::default();
        config.pointer.move_duration_ms = 0;
        config.pointer.pre_click_delay_ms = 0;
        MonitorService::new(
            Arc::new(std::sync::Mutex::new(deck.clone())),
            Arc::new(MockGrabber::new(1920, 1080)),
            pointer.map(|p| Arc::new(p) as Arc<dyn PointerController>),
            config,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_prepares_deck_and_mirrors() {
        // Arrange
        let deck = MockDeck::new();
        let mut monitor = service(&deck, None);

        // Act
        monitor.start().await.expect("start must succeed");
        tokio::time::sleep(Duration::from_millis(150)).await;
        monitor.stop().await;

        // Assert
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert_eq!(deck.brightness_calls(), vec![80]);
        assert_eq!(deck.reset_count(), 2, "reset on start and on stop");
        assert_eq!(deck.close_count(), 1);
        assert!(!deck.pushed_images().is_empty(), "mirroring must have painted keys");
    }

    #[tokio::test]
    async fn test_start_rejects_deck_without_displays() {
        let deck = MockDeck::non_visual();
        let mut monitor = service(&deck, None);

        let err = monitor.start().await.expect_err("non-visual deck must be rejected");

        assert!(matches!(err, MonitorError::Setup(DeckError::NotVisual(_))));
        assert_eq!(monitor.state(), MonitorState::Idle, "failed start stays idle");
        assert_eq!(deck.reset_count(), 0, "deck must be left untouched");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_twice_is_rejected() {
        let deck = MockDeck::new();
        let mut monitor = service(&deck, None);

        monitor.start().await.expect("first start succeeds");
        let err = monitor.start().await.expect_err("second start must fail");
        assert!(matches!(err, MonitorError::NotIdle(MonitorState::Running)));

        monitor.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_twice_reruns_teardown_without_failing() {
        let deck = MockDeck::new();
        let mut monitor = service(&deck, None);
        monitor.start().await.expect("start must succeed");

        monitor.stop().await;
        monitor.stop().await;

        assert_eq!(monitor.state(), MonitorState::Stopped);
        // Teardown runs on every stop call: reset on start plus one
        // reset+close pair per stop.
        assert_eq!(deck.reset_count(), 3);
        assert_eq!(deck.close_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_key_press_reaches_the_pointer() {
        // Arrange
        let deck = MockDeck::new();
        let pointer = MockPointer::new();
        let mut monitor = service(&deck, Some(pointer.clone()));
        monitor.start().await.expect("start must succeed");

        // Act: key 7 covers (768,360)-(1152,720); centre is (960,540).
        deck.inject_key_event(KeyEvent { key: 7, pressed: true });
        deck.inject_key_event(KeyEvent { key: 7, pressed: false });
        tokio::time::sleep(Duration::from_millis(150)).await;
        monitor.stop().await;

        // Assert
        assert_eq!(
            pointer.calls(),
            vec![PointerCall::MoveTo { x: 960, y: 540 }, PointerCall::Click]
        );
    }
}
