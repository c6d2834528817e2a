//! Pointer (mouse) control infrastructure.
//!
//! Clicking a key's screen region is an optional capability: the
//! [`PointerController`] implementation is constructed once at startup
//! and threaded through as `Option<Arc<dyn PointerController>>`.  When
//! construction fails (headless session, missing permissions, no
//! backend for the platform), the daemon runs with `None` and every
//! click request is dropped with a log line — mirroring still works.

use std::time::Duration;

use thiserror::Error;

pub mod enigo;
pub mod mock;

/// Error type for pointer injection operations.
#[derive(Debug, Error)]
pub enum PointerError {
    /// The pointer backend could not be initialised.
    #[error("pointer backend could not be initialised: {0}")]
    Unavailable(String),

    /// Injecting a move or click into the OS input stream failed.
    #[error("pointer injection failed: {0}")]
    InjectionFailed(String),
}

/// Trait for moving the cursor and clicking.
pub trait PointerController: Send + Sync {
    /// Moves the cursor to the absolute screen position `(x, y)`.
    ///
    /// `duration` is the glide time a human-visible move should take;
    /// backends without native glide support treat it as a settle delay
    /// after the jump so the frontmost application sees the hover
    /// before the click arrives.
    fn move_to(&self, x: i32, y: i32, duration: Duration) -> Result<(), PointerError>;

    /// Performs one primary-button click at the current position.
    fn click(&self) -> Result<(), PointerError>;
}
