//! # deckmirror-core
//!
//! Shared domain library for DeckMirror containing the screen region
//! mapping and the refresh-rate control state.
//!
//! This crate is used by the daemon application and its test suite.
//! It has zero dependencies on OS APIs, HID devices, or screen capture
//! backends, so every rule in it can be unit-tested on any machine.
//!
//! # What DeckMirror does
//!
//! DeckMirror turns a Stream Deck into a live miniature of the host
//! screen.  The screen is divided into a fixed 5×3 grid; each deck key
//! continuously shows a scaled-down capture of one grid cell.  Pressing
//! a key clicks the mouse at the centre of that key's cell (key 0 is
//! reserved for cycling the mirror's refresh rate).
//!
//! This crate defines the two pieces of real state behind that:
//!
//! - **`domain::regions`** – the key→screen-rectangle table.  Built once
//!   at startup from the screen resolution and the deck's key count,
//!   then shared read-only between the refresh loop (what to capture)
//!   and the key dispatcher (where to click).
//!
//! - **`domain::refresh`** – the frames-per-second state.  Written by
//!   the key dispatcher (preset cycling) and read by the refresh loop
//!   every iteration, so it lives in an atomic cell.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `deckmirror_core::RegionTable` instead of the full module path.
pub use domain::refresh::{next_preset, RateError, SharedRate, DEFAULT_RATE, RATE_PRESETS};
pub use domain::regions::{RegionTable, ScreenRect, FALLBACK_RECT, GRID_CELLS, GRID_COLS, GRID_ROWS};
