//! Deck device infrastructure.
//!
//! [`DeckDevice`] is the single boundary between DeckMirror and the
//! physical hardware: open/reset/close, key metadata, image pushes,
//! brightness, and key-state polling all go through it.  The real
//! implementation lives in [`hid`] (Stream Deck v2 protocol over raw
//! HID reports); [`mock`] provides an in-memory double for tests.
//!
//! # Exclusive device transactions
//!
//! Two execution contexts talk to the deck after startup: the mirror
//! loop (pushing one image per key every tick) and the key-event pump.
//! The device is therefore shared as [`SharedDeck`], and the mutex is
//! the scoped-exclusive-access primitive: the mirror loop holds the
//! guard for a whole per-tick batch of image pushes, so a concurrent
//! pump poll can never interleave its HID traffic mid-batch.

use std::sync::{Arc, Mutex};

use thiserror::Error;

pub mod hid;
pub mod mock;

/// Error type for deck device operations.
#[derive(Debug, Error)]
pub enum DeckError {
    /// No supported deck was found on the HID bus.
    #[error("no compatible deck found")]
    NoDeviceFound,

    /// The connected deck has no per-key displays to mirror onto.
    #[error("deck '{0}' has no key displays")]
    NotVisual(String),

    /// The HID layer reported a communication failure.
    #[error("HID communication failed: {0}")]
    Hid(String),

    /// A key index outside the deck's key range was addressed.
    #[error("key index {key} out of range (deck has {count} keys)")]
    InvalidKey { key: u8, count: u8 },

    /// Brightness outside the device's accepted 0–100 range.
    #[error("brightness {0}% out of range (0-100)")]
    InvalidBrightness(u8),
}

// ── Key image format ──────────────────────────────────────────────────────────

/// On-wire encoding of key images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyImageEncoding {
    /// JPEG (v2-protocol decks).
    Jpeg,
    /// BMP (v1-protocol decks; kept for the format type's completeness).
    Bmp,
}

/// Everything the imaging pipeline must know to produce bytes the deck
/// will accept for `set_key_image`.
#[derive(Debug, Clone, Copy)]
pub struct KeyImageFormat {
    /// Key display width in pixels.
    pub width: u32,
    /// Key display height in pixels.
    pub height: u32,
    /// Encoded byte format.
    pub encoding: KeyImageEncoding,
    /// Mirror the image horizontally before encoding.
    pub flip_horizontal: bool,
    /// Mirror the image vertically before encoding.
    pub flip_vertical: bool,
}

// ── Key events ────────────────────────────────────────────────────────────────

/// A key press or release observed on the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Zero-based key index.
    pub key: u8,
    /// `true` on press, `false` on release.
    pub pressed: bool,
}

// ── DeckDevice trait ──────────────────────────────────────────────────────────

/// Abstraction over one opened deck.
///
/// Methods taking `&mut self` perform HID traffic; callers serialise
/// access through [`SharedDeck`].
pub trait DeckDevice: Send {
    /// Human-readable model name (e.g. `"Stream Deck XL"`).
    fn model_name(&self) -> &str;

    /// Device serial number, or `"unknown"` if the OS withholds it.
    fn serial_number(&self) -> &str;

    /// Whether the deck has per-key displays at all.
    fn is_visual(&self) -> bool;

    /// Total number of keys.
    fn key_count(&self) -> u8;

    /// Physical key grid as `(columns, rows)`.
    fn key_layout(&self) -> (u8, u8);

    /// Pixel size and encoding required for key images.
    fn key_image_format(&self) -> KeyImageFormat;

    /// Clears all key displays and any in-flight image transfer state.
    fn reset(&mut self) -> Result<(), DeckError>;

    /// Sets the global key-display backlight, `0..=100` percent.
    fn set_brightness(&mut self, percent: u8) -> Result<(), DeckError>;

    /// Pushes an already-encoded image to one key's display.
    fn set_key_image(&mut self, key: u8, image: &[u8]) -> Result<(), DeckError>;

    /// Drains pending key-state changes without blocking.
    ///
    /// Returns one [`KeyEvent`] per key whose state differs from the
    /// previous poll, in key-index order per input report.
    fn poll_key_events(&mut self) -> Result<Vec<KeyEvent>, DeckError>;

    /// Releases the device.  Must be safe to call repeatedly: shutdown
    /// re-runs the reset/close teardown on every stop request.
    fn close(&mut self) -> Result<(), DeckError>;
}

/// Shared handle used by both concurrent contexts; see module docs.
pub type SharedDeck = Arc<Mutex<dyn DeckDevice>>;
