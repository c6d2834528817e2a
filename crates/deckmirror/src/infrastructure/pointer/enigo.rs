//! Pointer injection via the cross-platform `enigo` crate.

use std::sync::Mutex;
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

use super::{PointerController, PointerError};

/// [`PointerController`] backed by `enigo`.
///
/// `Enigo` is not `Sync`, so the handle lives behind a mutex; pointer
/// actions are rare (one per key press) and never contended in
/// practice.
pub struct EnigoPointer {
    enigo: Mutex<Enigo>,
}

impl EnigoPointer {
    /// Initialises the OS input backend.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::Unavailable`] when the platform backend
    /// refuses to start (e.g. no compositor permission on Wayland).
    pub fn new() -> Result<Self, PointerError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PointerError::Unavailable(e.to_string()))?;
        Ok(Self { enigo: Mutex::new(enigo) })
    }
}

impl PointerController for EnigoPointer {
    fn move_to(&self, x: i32, y: i32, duration: Duration) -> Result<(), PointerError> {
        {
            let mut enigo = self.enigo.lock().expect("enigo mutex poisoned");
            enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(|e| PointerError::InjectionFailed(e.to_string()))?;
        }
        // enigo jumps instantly; honour the requested glide time as a
        // settle delay so the target window registers the hover.
        std::thread::sleep(duration);
        Ok(())
    }

    fn click(&self) -> Result<(), PointerError> {
        let mut enigo = self.enigo.lock().expect("enigo mutex poisoned");
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| PointerError::InjectionFailed(e.to_string()))
    }
}
