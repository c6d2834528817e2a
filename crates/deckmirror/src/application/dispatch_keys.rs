//! Deck key-event handling.
//!
//! Presses do things, releases are only logged.  Key 0 is reserved for
//! cycling the refresh rate through its presets; every other key clicks
//! the centre of its mirrored screen region, turning the deck into a
//! 15-button touch surface for the host screen.
//!
//! Pointer control is an optional capability: with no
//! [`PointerController`] available the dispatcher still handles rate
//! cycling, and click requests are dropped with a log line.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use deckmirror_core::{RegionTable, SharedRate};

use crate::infrastructure::deck::KeyEvent;
use crate::infrastructure::pointer::PointerController;

/// The key that cycles the refresh rate instead of clicking.
pub const RATE_CYCLE_KEY: u8 = 0;

/// Routes deck key events to their actions.
pub struct InputDispatcher {
    regions: Arc<RegionTable>,
    rate: Arc<SharedRate>,
    pointer: Option<Arc<dyn PointerController>>,
    move_duration: Duration,
    pre_click_delay: Duration,
}

impl InputDispatcher {
    pub fn new(
        regions: Arc<RegionTable>,
        rate: Arc<SharedRate>,
        pointer: Option<Arc<dyn PointerController>>,
        move_duration: Duration,
        pre_click_delay: Duration,
    ) -> Self {
        Self { regions, rate, pointer, move_duration, pre_click_delay }
    }

    /// Handles one key event.
    ///
    /// Runs on the event pump's blocking thread; the pre-click delay is
    /// a plain sleep so the frontmost application sees the cursor
    /// arrive before the button goes down.
    pub fn on_key_event(&self, event: KeyEvent) {
        if !event.pressed {
            debug!(key = event.key, "key released");
            return;
        }

        if event.key == RATE_CYCLE_KEY {
            let rate = self.rate.cycle();
            info!(rate, "refresh rate cycled");
            return;
        }

        let Some(region) = self.regions.get(event.key as usize) else {
            warn!(key = event.key, "press on key with no region entry");
            return;
        };
        let (x, y) = region.center();

        let Some(pointer) = &self.pointer else {
            debug!(key = event.key, x, y, "pointer unavailable, dropping click");
            return;
        };

        debug!(key = event.key, x, y, "clicking key region centre");
        if let Err(e) = pointer.move_to(x, y, self.move_duration) {
            warn!(key = event.key, error = %e, "pointer move failed");
            return;
        }
        std::thread::sleep(self.pre_click_delay);
        if let Err(e) = pointer.click() {
            warn!(key = event.key, error = %e, "pointer click failed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::pointer::mock::{MockPointer, PointerCall};
    use deckmirror_core::RATE_PRESETS;

    fn dispatcher(pointer: Option<MockPointer>, rate: &Arc<SharedRate>) -> InputDispatcher {
        InputDispatcher::new(
            Arc::new(RegionTable::build(1920, 1080, 15)),
            Arc::clone(rate),
            pointer.map(|p| Arc::new(p) as Arc<dyn PointerController>),
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_key_zero_press_cycles_rate_without_touching_pointer() {
        // Arrange
        let rate = Arc::new(SharedRate::new(1.0));
        let pointer = MockPointer::new();
        let dispatcher = dispatcher(Some(pointer.clone()), &rate);

        // Act
        dispatcher.on_key_event(KeyEvent { key: 0, pressed: true });

        // Assert
        assert_eq!(rate.get(), 2.0, "1.0 must cycle to the next preset");
        assert!(pointer.calls().is_empty(), "rate key must never click");
    }

    #[test]
    fn test_key_zero_from_off_list_rate_enters_presets() {
        let rate = Arc::new(SharedRate::new(20.0));
        let dispatcher = dispatcher(None, &rate);

        dispatcher.on_key_event(KeyEvent { key: 0, pressed: true });

        assert!(RATE_PRESETS.contains(&rate.get()));
        assert_eq!(rate.get(), 5.0);
    }

    #[test]
    fn test_press_clicks_region_centre_with_floor_division() {
        // Arrange: key 1 covers (384,0)-(768,360); centre floors to (576,180).
        let rate = Arc::new(SharedRate::new(1.0));
        let pointer = MockPointer::new();
        let dispatcher = dispatcher(Some(pointer.clone()), &rate);

        // Act
        dispatcher.on_key_event(KeyEvent { key: 1, pressed: true });

        // Assert: exactly one move then one click.
        assert_eq!(
            pointer.calls(),
            vec![PointerCall::MoveTo { x: 576, y: 180 }, PointerCall::Click]
        );
    }

    #[test]
    fn test_release_does_nothing() {
        let rate = Arc::new(SharedRate::new(1.0));
        let pointer = MockPointer::new();
        let dispatcher = dispatcher(Some(pointer.clone()), &rate);

        dispatcher.on_key_event(KeyEvent { key: 0, pressed: false });
        dispatcher.on_key_event(KeyEvent { key: 3, pressed: false });

        assert_eq!(rate.get(), 1.0, "release must not cycle the rate");
        assert!(pointer.calls().is_empty(), "release must not click");
    }

    #[test]
    fn test_press_without_pointer_is_dropped_quietly() {
        let rate = Arc::new(SharedRate::new(1.0));
        let dispatcher = dispatcher(None, &rate);

        // Must not panic and must not affect the rate.
        dispatcher.on_key_event(KeyEvent { key: 5, pressed: true });
        assert_eq!(rate.get(), 1.0);
    }

    #[test]
    fn test_press_outside_region_table_is_ignored() {
        let rate = Arc::new(SharedRate::new(1.0));
        let pointer = MockPointer::new();
        let dispatcher = dispatcher(Some(pointer.clone()), &rate);

        dispatcher.on_key_event(KeyEvent { key: 200, pressed: true });

        assert!(pointer.calls().is_empty());
    }

    #[test]
    fn test_failed_move_suppresses_the_click() {
        let rate = Arc::new(SharedRate::new(1.0));
        let pointer = MockPointer::failing();
        let dispatcher = dispatcher(Some(pointer.clone()), &rate);

        // Must not panic; the click must not be attempted after a failed move.
        dispatcher.on_key_event(KeyEvent { key: 2, pressed: true });
        assert!(pointer.calls().is_empty());
    }
}
