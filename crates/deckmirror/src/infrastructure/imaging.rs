//! Key image pipeline: resize, orient, and encode captured pixels into
//! the deck's native format.
//!
//! Quality beats speed here: a tick encodes at most `key_count` thumb
//! images, so Lanczos3 resampling is affordable and visibly sharper on
//! 72×72 key displays than the faster filters.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbaImage};

use crate::infrastructure::capture::{CaptureError, RawFrame};
use crate::infrastructure::deck::{KeyImageEncoding, KeyImageFormat};

/// JPEG quality used for key images.  The displays are tiny; 95 keeps
/// text legible without noticeable transfer cost.
const JPEG_QUALITY: u8 = 95;

/// Resizes `frame` to the deck's key size, applies the device's
/// orientation requirements, and encodes to the native byte format.
///
/// # Errors
///
/// Returns [`CaptureError::Encode`] when the raw buffer does not match
/// its declared dimensions or the encoder fails.
pub fn encode_key_image(frame: &RawFrame, format: &KeyImageFormat) -> Result<Vec<u8>, CaptureError> {
    let source = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| CaptureError::Encode("frame buffer does not match dimensions".to_string()))?;

    let mut resized = imageops::resize(
        &source,
        format.width,
        format.height,
        imageops::FilterType::Lanczos3,
    );

    if format.flip_horizontal {
        imageops::flip_horizontal_in_place(&mut resized);
    }
    if format.flip_vertical {
        imageops::flip_vertical_in_place(&mut resized);
    }

    // Key displays have no alpha channel.
    let rgb = DynamicImage::ImageRgba8(resized).into_rgb8();
    let mut encoded = Vec::new();

    match format.encoding {
        KeyImageEncoding::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut encoded), JPEG_QUALITY);
            encoder
                .encode_image(&rgb)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }
        KeyImageEncoding::Bmp => {
            DynamicImage::ImageRgb8(rgb)
                .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Bmp)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }
    }

    Ok(encoded)
}
