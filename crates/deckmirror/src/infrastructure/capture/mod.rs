//! Screen capture infrastructure.
//!
//! [`ScreenGrabber`] is the boundary to the OS screen-capture API: the
//! frame producer asks it for the full screen size once at startup and
//! then for one sub-region per key per tick.  The correct platform
//! implementation is selected at compile time via `#[cfg(target_os)]`
//! and re-exported as `NativeGrabber`:
//!
//! | Module    | OS      | API used                         |
//! |-----------|---------|----------------------------------|
//! | `windows` | Windows | GDI `BitBlt` + `GetDIBits`       |
//! | `linux`   | Linux   | Xlib `XGetImage` (ZPixmap)       |
//!
//! A [`mock::MockGrabber`] is always compiled (not guarded by `#[cfg]`)
//! so tests on any platform can run without a display server.

use deckmirror_core::ScreenRect;
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub use linux::XlibGrabber as NativeGrabber;

#[cfg(target_os = "windows")]
pub mod windows;
#[cfg(target_os = "windows")]
pub use windows::GdiGrabber as NativeGrabber;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub mod unsupported;
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub use unsupported::UnsupportedGrabber as NativeGrabber;

/// Error type for capture operations.
///
/// Capture errors are per-key and per-tick: the affected key simply
/// keeps its previous image until the next tick succeeds.  Only a
/// failure of `screen_size` during setup is treated as fatal.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture backend could not be initialised at all.
    #[error("capture backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The platform API rejected or failed the capture call.
    #[error("platform API error during capture: {0}")]
    Platform(String),

    /// The requested rectangle lies (partly) outside the screen.
    #[error("region ({x1},{y1})-({x2},{y2}) is outside the {width}x{height} screen")]
    OutOfBounds {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        width: u32,
        height: u32,
    },

    /// The rectangle has zero area, so there is nothing to capture.
    #[error("degenerate region has no pixels")]
    EmptyRegion,

    /// Resizing or encoding the captured pixels failed.
    #[error("key image encoding failed: {0}")]
    Encode(String),
}

/// A captured frame: tightly packed 8-bit RGBA rows, top to bottom.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Expected byte length for the frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Trait for grabbing screen pixels on the current platform.
///
/// Implementations are shared between the setup path and the refresh
/// loop, so they must be `Send + Sync`; platform handles that are not
/// thread-safe are serialised internally.
pub trait ScreenGrabber: Send + Sync {
    /// Current full-screen size in pixels, `(width, height)`.
    fn screen_size(&self) -> Result<(u32, u32), CaptureError>;

    /// Captures exactly `region` and returns its pixels.
    fn grab(&self, region: ScreenRect) -> Result<RawFrame, CaptureError>;
}

/// Shared bounds check used by the platform implementations.
///
/// Rejects degenerate rectangles and anything sticking out of the
/// screen — notably the unclamped fallback rectangle on screens smaller
/// than 100×100, which must fail per-tick rather than crash the
/// platform call.
pub(crate) fn check_region(region: &ScreenRect, width: u32, height: u32) -> Result<(), CaptureError> {
    if region.is_degenerate() {
        return Err(CaptureError::EmptyRegion);
    }
    if region.x1 < 0 || region.y1 < 0 || region.x2 > width as i32 || region.y2 > height as i32 {
        return Err(CaptureError::OutOfBounds {
            x1: region.x1,
            y1: region.y1,
            x2: region.x2,
            y2: region.y2,
            width,
            height,
        });
    }
    Ok(())
}
