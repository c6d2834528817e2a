//! Mock screen grabber for unit testing.
//!
//! Returns synthetic solid-colour frames of the requested size and can
//! be told to fail for specific regions, so tests can exercise the
//! "skip this key, keep going" path of the refresh loop.

use std::sync::{Arc, Mutex};

use deckmirror_core::ScreenRect;

use super::{check_region, CaptureError, RawFrame, ScreenGrabber};

/// A mock implementation of [`ScreenGrabber`].
///
/// Cloning shares the failure list and call counter.
#[derive(Clone)]
pub struct MockGrabber {
    width: u32,
    height: u32,
    /// Regions whose grabs fail with a synthetic platform error.
    fail_regions: Arc<Mutex<Vec<ScreenRect>>>,
    grab_count: Arc<Mutex<u32>>,
}

impl MockGrabber {
    /// Creates a grabber reporting a `width` × `height` screen.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_regions: Arc::new(Mutex::new(Vec::new())),
            grab_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Makes future grabs of exactly `region` fail.
    pub fn fail_region(&self, region: ScreenRect) {
        self.fail_regions.lock().expect("mock state poisoned").push(region);
    }

    /// Number of `grab` calls made so far (including failed ones).
    pub fn grab_count(&self) -> u32 {
        *self.grab_count.lock().expect("mock state poisoned")
    }
}

impl ScreenGrabber for MockGrabber {
    fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
        Ok((self.width, self.height))
    }

    fn grab(&self, region: ScreenRect) -> Result<RawFrame, CaptureError> {
        *self.grab_count.lock().expect("mock state poisoned") += 1;
        check_region(&region, self.width, self.height)?;

        if self.fail_regions.lock().expect("mock state poisoned").contains(&region) {
            return Err(CaptureError::Platform("synthetic grab failure".to_string()));
        }

        let width = region.width() as u32;
        let height = region.height() as u32;
        // Mid-grey, fully opaque.
        let data = [127u8, 127, 127, 255].repeat(width as usize * height as usize);
        Ok(RawFrame { width, height, data })
    }
}
