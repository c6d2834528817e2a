//! Mock deck for unit and integration testing.
//!
//! Records every image push, brightness change, reset, and close, and
//! lets tests inject synthetic key events that [`poll_key_events`]
//! returns on the next pump poll — no hardware or HID stack required.
//!
//! [`poll_key_events`]: super::DeckDevice::poll_key_events

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{DeckDevice, DeckError, KeyEvent, KeyImageEncoding, KeyImageFormat};

#[derive(Default)]
struct MockState {
    /// `(key, encoded_byte_len)` per `set_key_image` call, in order.
    images: Vec<(u8, usize)>,
    brightness_calls: Vec<u8>,
    reset_count: u32,
    close_count: u32,
    pending_events: VecDeque<KeyEvent>,
    /// Keys whose image pushes should fail with a synthetic HID error.
    fail_image_keys: Vec<u8>,
}

/// A mock implementation of [`DeckDevice`].
///
/// Cloning shares the recorded state, so a test can hand one clone to
/// the service under test and keep another for assertions.
#[derive(Clone)]
pub struct MockDeck {
    state: Arc<Mutex<MockState>>,
    cols: u8,
    rows: u8,
    visual: bool,
}

impl MockDeck {
    /// Creates a visual 5×3 mock deck (15 keys, 72×72 JPEG).
    pub fn new() -> Self {
        Self::with_layout(5, 3)
    }

    /// Creates a visual mock deck with an arbitrary key grid.
    pub fn with_layout(cols: u8, rows: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            cols,
            rows,
            visual: true,
        }
    }

    /// Creates a deck that reports no key displays, for setup-failure tests.
    pub fn non_visual() -> Self {
        Self { visual: false, ..Self::new() }
    }

    /// Queues a synthetic key event for the next `poll_key_events` call.
    pub fn inject_key_event(&self, event: KeyEvent) {
        self.state.lock().expect("mock state poisoned").pending_events.push_back(event);
    }

    /// Makes future image pushes to `key` fail with [`DeckError::Hid`].
    pub fn fail_images_for_key(&self, key: u8) {
        self.state.lock().expect("mock state poisoned").fail_image_keys.push(key);
    }

    /// `(key, encoded_byte_len)` pairs recorded so far.
    pub fn pushed_images(&self) -> Vec<(u8, usize)> {
        self.state.lock().expect("mock state poisoned").images.clone()
    }

    /// Brightness percentages in call order.
    pub fn brightness_calls(&self) -> Vec<u8> {
        self.state.lock().expect("mock state poisoned").brightness_calls.clone()
    }

    /// Number of `reset` calls.
    pub fn reset_count(&self) -> u32 {
        self.state.lock().expect("mock state poisoned").reset_count
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> u32 {
        self.state.lock().expect("mock state poisoned").close_count
    }
}

impl Default for MockDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckDevice for MockDeck {
    fn model_name(&self) -> &str {
        "Mock Deck"
    }

    fn serial_number(&self) -> &str {
        "MOCK0001"
    }

    fn is_visual(&self) -> bool {
        self.visual
    }

    fn key_count(&self) -> u8 {
        self.cols * self.rows
    }

    fn key_layout(&self) -> (u8, u8) {
        (self.cols, self.rows)
    }

    fn key_image_format(&self) -> KeyImageFormat {
        KeyImageFormat {
            width: 72,
            height: 72,
            encoding: KeyImageEncoding::Jpeg,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }

    fn reset(&mut self) -> Result<(), DeckError> {
        self.state.lock().expect("mock state poisoned").reset_count += 1;
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DeckError> {
        if percent > 100 {
            return Err(DeckError::InvalidBrightness(percent));
        }
        self.state.lock().expect("mock state poisoned").brightness_calls.push(percent);
        Ok(())
    }

    fn set_key_image(&mut self, key: u8, image: &[u8]) -> Result<(), DeckError> {
        if key >= self.key_count() {
            return Err(DeckError::InvalidKey { key, count: self.key_count() });
        }
        let mut state = self.state.lock().expect("mock state poisoned");
        if state.fail_image_keys.contains(&key) {
            return Err(DeckError::Hid(format!("synthetic failure for key {key}")));
        }
        state.images.push((key, image.len()));
        Ok(())
    }

    fn poll_key_events(&mut self) -> Result<Vec<KeyEvent>, DeckError> {
        let mut state = self.state.lock().expect("mock state poisoned");
        Ok(state.pending_events.drain(..).collect())
    }

    fn close(&mut self) -> Result<(), DeckError> {
        self.state.lock().expect("mock state poisoned").close_count += 1;
        Ok(())
    }
}
