//! Per-key frame production: screen region in, deck-ready bytes out.

use std::sync::Arc;

use deckmirror_core::ScreenRect;

use crate::infrastructure::capture::{CaptureError, ScreenGrabber};
use crate::infrastructure::deck::KeyImageFormat;
use crate::infrastructure::imaging::encode_key_image;

/// Produces encoded key images from screen regions.
///
/// Stateless apart from its collaborators: the grabber is shared with
/// the setup path, and the image format is fixed per opened deck.
pub struct FrameProducer {
    grabber: Arc<dyn ScreenGrabber>,
    format: KeyImageFormat,
}

impl FrameProducer {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, format: KeyImageFormat) -> Self {
        Self { grabber, format }
    }

    /// Captures `region` and encodes it for the deck.
    ///
    /// Degenerate regions are rejected before touching the platform
    /// capture API; they occur when grid clamping collapses an
    /// edge cell on a very small screen.
    ///
    /// # Errors
    ///
    /// Any [`CaptureError`]; callers treat these as per-key, per-tick
    /// failures and keep the key's previous image.
    pub fn capture_key(&self, region: &ScreenRect) -> Result<Vec<u8>, CaptureError> {
        if region.is_degenerate() {
            return Err(CaptureError::EmptyRegion);
        }
        let frame = self.grabber.grab(*region)?;
        encode_key_image(&frame, &self.format)
    }
}
