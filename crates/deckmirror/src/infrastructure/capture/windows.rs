//! Windows screen capture via GDI.
//!
//! Copies the requested region of the primary display into a
//! memory-device-context bitmap with `BitBlt`, then reads it back as a
//! top-down 32-bit DIB and converts BGRA to RGBA.  GDI is slower than
//! DXGI desktop duplication but has no device-reset edge cases and
//! handles arbitrary sub-regions directly, which fits a per-key capture
//! pattern at deck refresh rates.

use deckmirror_core::ScreenRect;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use super::{check_region, CaptureError, RawFrame, ScreenGrabber};

/// Windows GDI implementation of [`ScreenGrabber`].
pub struct GdiGrabber;

impl GdiGrabber {
    /// Creates the grabber (no initialisation cost; GDI is always present).
    pub fn new() -> Result<Self, CaptureError> {
        Ok(Self)
    }
}

impl ScreenGrabber for GdiGrabber {
    fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
        // SAFETY: GetSystemMetrics has no preconditions.
        let (width, height) = unsafe {
            (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN))
        };
        if width <= 0 || height <= 0 {
            return Err(CaptureError::Platform("GetSystemMetrics returned 0".to_string()));
        }
        Ok((width as u32, height as u32))
    }

    fn grab(&self, region: ScreenRect) -> Result<RawFrame, CaptureError> {
        let (screen_w, screen_h) = self.screen_size()?;
        check_region(&region, screen_w, screen_h)?;

        let width = region.width();
        let height = region.height();

        // SAFETY: all handles created below are released before return;
        // failure paths release whatever was created up to that point.
        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(CaptureError::Platform("GetDC failed".to_string()));
            }

            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(mem_dc, 0, 0, width, height, screen_dc, region.x1, region.y1, SRCCOPY);

            let mut frame = Err(CaptureError::Platform("BitBlt failed".to_string()));
            if blit.is_ok() {
                // Negative height requests a top-down DIB.
                let mut info = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: width,
                        biHeight: -height,
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    },
                    ..Default::default()
                };

                let mut data = vec![0u8; width as usize * height as usize * 4];
                let lines = GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(data.as_mut_ptr() as *mut _),
                    &mut info,
                    DIB_RGB_COLORS,
                );

                if lines == height {
                    // GDI delivers BGRA; swap to RGBA and force opaque alpha.
                    for px in data.chunks_exact_mut(4) {
                        px.swap(0, 2);
                        px[3] = 255;
                    }
                    frame = Ok(RawFrame {
                        width: width as u32,
                        height: height as u32,
                        data,
                    });
                } else {
                    frame = Err(CaptureError::Platform("GetDIBits returned short read".to_string()));
                }
            }

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            frame
        }
    }
}
