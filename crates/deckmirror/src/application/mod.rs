//! Application-layer use cases.
//!
//! Each submodule is one use case wired from domain types
//! (`deckmirror-core`) and infrastructure traits:
//!
//! - [`produce_frames`] — capture one key's screen region and encode it
//!   for the deck display.
//! - [`refresh_loop`] — the paced loop that repaints every key.
//! - [`dispatch_keys`] — react to deck key presses (rate cycling,
//!   region clicks).
//! - [`monitor`] — lifecycle orchestration tying the above together.

pub mod dispatch_keys;
pub mod monitor;
pub mod produce_frames;
pub mod refresh_loop;
