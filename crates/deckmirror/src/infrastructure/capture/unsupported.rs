//! Fallback grabber for platforms without a capture implementation.
//!
//! The type exists so the daemon compiles everywhere; construction
//! fails at runtime with a clear message (mirroring requires a
//! supported capture backend).

use deckmirror_core::ScreenRect;

use super::{CaptureError, RawFrame, ScreenGrabber};

/// Placeholder [`ScreenGrabber`] for unsupported platforms.
pub struct UnsupportedGrabber;

impl UnsupportedGrabber {
    /// Always fails: there is no capture backend on this platform.
    pub fn new() -> Result<Self, CaptureError> {
        Err(CaptureError::BackendUnavailable(
            "no screen capture backend for this platform".to_string(),
        ))
    }
}

impl ScreenGrabber for UnsupportedGrabber {
    fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
        Err(CaptureError::BackendUnavailable(
            "no screen capture backend for this platform".to_string(),
        ))
    }

    fn grab(&self, _region: ScreenRect) -> Result<RawFrame, CaptureError> {
        Err(CaptureError::BackendUnavailable(
            "no screen capture backend for this platform".to_string(),
        ))
    }
}
