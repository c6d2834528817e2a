//! Stream Deck v2 HID driver.
//!
//! Speaks the second-generation Stream Deck protocol over raw HID
//! reports via the `hidapi` crate.  Three report families are used:
//!
//! - **Image upload** – output reports of 1024 bytes:
//!   `[0x02, 0x07, key, is_last, len u16le, seq u16le, payload…]`,
//!   carrying up to 1016 bytes of encoded JPEG per report.
//! - **Commands** – feature report `0x03` with a sub-command byte:
//!   `0x02` resets the deck, `0x08` sets brightness (`[0x03, 0x08, pct]`).
//! - **Key state** – input reports with id `0x01`, a 3-byte header and
//!   one byte per key (non-zero = pressed).
//!
//! The v2 family renders key images rotated 180°, so the image format
//! advertises both flips and the imaging pipeline compensates before
//! encoding.

use hidapi::{HidApi, HidDevice};
use tracing::{debug, trace};

use super::{DeckDevice, DeckError, KeyEvent, KeyImageEncoding, KeyImageFormat};

/// Elgato Systems USB vendor id.
const ELGATO_VID: u16 = 0x0fd9;

/// Image upload output report id.
const OUTPUT_REPORT_IMAGE: u8 = 0x02;
/// v2 image upload command byte.
const IMAGE_COMMAND_V2: u8 = 0x07;
/// Feature report id carrying v2 commands.
const FEATURE_REPORT_COMMANDS: u8 = 0x03;
/// Reset sub-command.
const COMMAND_RESET: u8 = 0x02;
/// Brightness sub-command.
const COMMAND_BRIGHTNESS: u8 = 0x08;

/// Total image report size including the report id byte.
const IMAGE_REPORT_SIZE: usize = 1024;
/// Image report header: id, command, key, is_last, len u16, seq u16.
const IMAGE_REPORT_HEADER: usize = 8;
/// Payload bytes per image report.
const IMAGE_REPORT_PAYLOAD: usize = IMAGE_REPORT_SIZE - IMAGE_REPORT_HEADER;
/// Feature report size for command reports.
const FEATURE_REPORT_SIZE: usize = 32;
/// Key input report id.
const INPUT_REPORT_KEYS: u8 = 0x01;
/// Offset of the first key-state byte in an input report (id + header).
const INPUT_KEY_OFFSET: usize = 4;

// ── Supported models ──────────────────────────────────────────────────────────

/// Static description of one supported v2-protocol model.
struct ModelSpec {
    pid: u16,
    name: &'static str,
    cols: u8,
    rows: u8,
    image_size: u32,
}

/// v2-protocol decks this driver knows how to drive.
const SUPPORTED_MODELS: &[ModelSpec] = &[
    ModelSpec { pid: 0x006d, name: "Stream Deck Original V2", cols: 5, rows: 3, image_size: 72 },
    ModelSpec { pid: 0x0080, name: "Stream Deck MK.2", cols: 5, rows: 3, image_size: 72 },
    ModelSpec { pid: 0x006c, name: "Stream Deck XL", cols: 8, rows: 4, image_size: 96 },
];

fn hid_err(e: hidapi::HidError) -> DeckError {
    DeckError::Hid(e.to_string())
}

// ── HidDeck ───────────────────────────────────────────────────────────────────

/// An opened v2-protocol deck.
pub struct HidDeck {
    device: HidDevice,
    spec: &'static ModelSpec,
    serial: String,
    /// Last observed pressed/released state per key, for event diffing.
    key_states: Vec<bool>,
}

impl HidDeck {
    /// Enumerates the HID bus and opens the first supported deck.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::NoDeviceFound`] when nothing matches, or
    /// [`DeckError::Hid`] when a matching device refuses to open.
    pub fn open_first() -> Result<Self, DeckError> {
        let api = HidApi::new().map_err(hid_err)?;

        for info in api.device_list() {
            if info.vendor_id() != ELGATO_VID {
                continue;
            }
            let Some(spec) = SUPPORTED_MODELS.iter().find(|m| m.pid == info.product_id()) else {
                debug!(pid = format!("{:#06x}", info.product_id()), "skipping unsupported Elgato device");
                continue;
            };

            let device = info.open_device(&api).map_err(hid_err)?;
            // Key polling must never block the event pump.
            device.set_blocking_mode(false).map_err(hid_err)?;
            let serial = info.serial_number().unwrap_or("unknown").to_string();
            let key_count = spec.cols as usize * spec.rows as usize;

            return Ok(Self {
                device,
                spec,
                serial,
                key_states: vec![false; key_count],
            });
        }

        Err(DeckError::NoDeviceFound)
    }

    /// Sends a `[0x03, sub_command, arg…]` feature report.
    fn send_command(&self, sub_command: u8, arg: Option<u8>) -> Result<(), DeckError> {
        let mut report = [0u8; FEATURE_REPORT_SIZE];
        report[0] = FEATURE_REPORT_COMMANDS;
        report[1] = sub_command;
        if let Some(arg) = arg {
            report[2] = arg;
        }
        self.device.send_feature_report(&report).map_err(hid_err)
    }
}

impl DeckDevice for HidDeck {
    fn model_name(&self) -> &str {
        self.spec.name
    }

    fn serial_number(&self) -> &str {
        &self.serial
    }

    fn is_visual(&self) -> bool {
        // Every supported model has per-key LCDs.
        true
    }

    fn key_count(&self) -> u8 {
        self.spec.cols * self.spec.rows
    }

    fn key_layout(&self) -> (u8, u8) {
        (self.spec.cols, self.spec.rows)
    }

    fn key_image_format(&self) -> KeyImageFormat {
        KeyImageFormat {
            width: self.spec.image_size,
            height: self.spec.image_size,
            encoding: KeyImageEncoding::Jpeg,
            flip_horizontal: true,
            flip_vertical: true,
        }
    }

    fn reset(&mut self) -> Result<(), DeckError> {
        self.key_states.fill(false);
        self.send_command(COMMAND_RESET, None)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DeckError> {
        if percent > 100 {
            return Err(DeckError::InvalidBrightness(percent));
        }
        self.send_command(COMMAND_BRIGHTNESS, Some(percent))
    }

    fn set_key_image(&mut self, key: u8, image: &[u8]) -> Result<(), DeckError> {
        if key >= self.key_count() {
            return Err(DeckError::InvalidKey { key, count: self.key_count() });
        }

        let mut remaining = image;
        let mut sequence: u16 = 0;
        loop {
            let chunk = remaining.len().min(IMAGE_REPORT_PAYLOAD);
            let is_last = chunk == remaining.len();

            let mut report = [0u8; IMAGE_REPORT_SIZE];
            report[0] = OUTPUT_REPORT_IMAGE;
            report[1] = IMAGE_COMMAND_V2;
            report[2] = key;
            report[3] = is_last as u8;
            report[4..6].copy_from_slice(&(chunk as u16).to_le_bytes());
            report[6..8].copy_from_slice(&sequence.to_le_bytes());
            report[IMAGE_REPORT_HEADER..IMAGE_REPORT_HEADER + chunk]
                .copy_from_slice(&remaining[..chunk]);

            self.device.write(&report).map_err(hid_err)?;

            remaining = &remaining[chunk..];
            sequence += 1;
            if is_last {
                break;
            }
        }

        trace!(key, bytes = image.len(), reports = sequence, "key image uploaded");
        Ok(())
    }

    fn poll_key_events(&mut self) -> Result<Vec<KeyEvent>, DeckError> {
        let mut events = Vec::new();
        let mut buf = [0u8; 512];

        // Drain every queued input report; the device is non-blocking.
        loop {
            let read = self.device.read(&mut buf).map_err(hid_err)?;
            if read == 0 {
                break;
            }
            if buf[0] != INPUT_REPORT_KEYS || read <= INPUT_KEY_OFFSET {
                continue;
            }

            for key in 0..self.key_count() as usize {
                let offset = INPUT_KEY_OFFSET + key;
                if offset >= read {
                    break;
                }
                let pressed = buf[offset] != 0;
                if pressed != self.key_states[key] {
                    self.key_states[key] = pressed;
                    events.push(KeyEvent { key: key as u8, pressed });
                }
            }
        }

        Ok(events)
    }

    fn close(&mut self) -> Result<(), DeckError> {
        // hidapi releases the handle on drop; nothing to flush beyond
        // forgetting stale key state.
        self.key_states.fill(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_models_cover_15_and_32_key_layouts() {
        let key_counts: Vec<u8> = SUPPORTED_MODELS.iter().map(|m| m.cols * m.rows).collect();
        assert!(key_counts.contains(&15));
        assert!(key_counts.contains(&32));
    }

    #[test]
    fn test_image_report_payload_leaves_room_for_header() {
        assert_eq!(IMAGE_REPORT_PAYLOAD + IMAGE_REPORT_HEADER, IMAGE_REPORT_SIZE);
        assert_eq!(IMAGE_REPORT_PAYLOAD, 1016);
    }
}
