//! Linux screen capture via the X11 Xlib API.
//!
//! Grabs sub-regions of the root window with `XGetImage` in ZPixmap
//! format and converts the 32-bit BGRX pixel layout to tightly packed
//! RGBA.  If the `DISPLAY` environment variable is not set or Xlib is
//! unavailable, construction fails and the daemon aborts during setup.
//!
//! # Implementation notes
//!
//! One X connection is opened per grabber and reused for every grab.
//! Xlib connections are not thread-safe, so the raw display pointer is
//! kept behind a mutex: all Xlib calls are serialised even though the
//! grabber itself is shared as `Arc<dyn ScreenGrabber>`.

use std::sync::Mutex;

use deckmirror_core::ScreenRect;
use x11::xlib;

use super::{check_region, CaptureError, RawFrame, ScreenGrabber};

/// Owned X display connection pointer.
struct DisplayPtr(*mut xlib::Display);

// SAFETY: an Xlib display handle may be used from any thread as long as
// calls are never concurrent; every use below happens under the
// grabber's mutex, and the pointer is only closed in Drop.
unsafe impl Send for DisplayPtr {}

/// Linux Xlib implementation of [`ScreenGrabber`].
pub struct XlibGrabber {
    display: Mutex<DisplayPtr>,
}

impl XlibGrabber {
    /// Opens a connection to the default X display.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BackendUnavailable`] if the display
    /// cannot be opened (e.g. `DISPLAY` unset, no X server).
    pub fn new() -> Result<Self, CaptureError> {
        // SAFETY: XOpenDisplay accepts a null pointer meaning "use $DISPLAY".
        let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };

        if display.is_null() {
            let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(CaptureError::BackendUnavailable(format!(
                "XOpenDisplay failed; DISPLAY={display_env}"
            )));
        }

        Ok(Self {
            display: Mutex::new(DisplayPtr(display)),
        })
    }
}

impl Drop for XlibGrabber {
    fn drop(&mut self) {
        let guard = self.display.lock().expect("display mutex poisoned");
        // SAFETY: the pointer was returned by XOpenDisplay and is not
        // used after this point.
        unsafe { xlib::XCloseDisplay(guard.0) };
    }
}

impl ScreenGrabber for XlibGrabber {
    fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
        let guard = self.display.lock().expect("display mutex poisoned");
        let display = guard.0;

        // SAFETY: `display` is a valid connection for the lifetime of self.
        let screen = unsafe { xlib::XDefaultScreen(display) };
        let width = unsafe { xlib::XDisplayWidth(display, screen) };
        let height = unsafe { xlib::XDisplayHeight(display, screen) };

        Ok((width as u32, height as u32))
    }

    fn grab(&self, region: ScreenRect) -> Result<RawFrame, CaptureError> {
        let guard = self.display.lock().expect("display mutex poisoned");
        let display = guard.0;

        // SAFETY: valid display; screen index comes from the same connection.
        let screen = unsafe { xlib::XDefaultScreen(display) };
        let screen_w = unsafe { xlib::XDisplayWidth(display, screen) } as u32;
        let screen_h = unsafe { xlib::XDisplayHeight(display, screen) } as u32;
        check_region(&region, screen_w, screen_h)?;

        let width = region.width() as u32;
        let height = region.height() as u32;
        let root = unsafe { xlib::XRootWindow(display, screen) };

        // SAFETY: the region was bounds-checked above, so XGetImage
        // cannot generate a BadMatch for out-of-drawable coordinates.
        let image = unsafe {
            xlib::XGetImage(
                display,
                root,
                region.x1,
                region.y1,
                width,
                height,
                !0, // all planes
                xlib::ZPixmap,
            )
        };

        if image.is_null() {
            return Err(CaptureError::Platform("XGetImage returned null".to_string()));
        }

        // SAFETY: `image` is non-null and owned by us until destroyed below.
        let result = unsafe { convert_zpixmap(image, width, height) };

        // SAFETY: destroy_image frees both the struct and its data buffer.
        unsafe {
            if let Some(destroy) = (*image).funcs.destroy_image {
                destroy(image);
            }
        }

        result
    }
}

/// Converts a 32-bpp ZPixmap [`xlib::XImage`] into packed RGBA.
///
/// # Safety
///
/// `image` must be a valid, non-null pointer to an XImage of at least
/// `width` × `height` pixels whose data buffer is readable.
unsafe fn convert_zpixmap(
    image: *mut xlib::XImage,
    width: u32,
    height: u32,
) -> Result<RawFrame, CaptureError> {
    let bits_per_pixel = (*image).bits_per_pixel;
    if bits_per_pixel != 32 {
        return Err(CaptureError::Platform(format!(
            "unsupported visual: {bits_per_pixel} bits per pixel (expected 32)"
        )));
    }

    let bytes_per_line = (*image).bytes_per_line as usize;
    let src = (*image).data as *const u8;
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);

    for row in 0..height as usize {
        let line = src.add(row * bytes_per_line);
        for col in 0..width as usize {
            // Little-endian TrueColor ZPixmap: B, G, R, X in memory.
            let px = line.add(col * 4);
            data.push(*px.add(2));
            data.push(*px.add(1));
            data.push(*px);
            data.push(255);
        }
    }

    Ok(RawFrame { width, height, data })
}
