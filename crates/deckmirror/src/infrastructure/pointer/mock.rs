//! Mock pointer controller for unit testing.
//!
//! Records every move and click instead of injecting OS input.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{PointerController, PointerError};

/// One recorded pointer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerCall {
    MoveTo { x: i32, y: i32 },
    Click,
}

/// A mock implementation of [`PointerController`].
///
/// Cloning shares the recorded call list.
#[derive(Clone, Default)]
pub struct MockPointer {
    calls: Arc<Mutex<Vec<PointerCall>>>,
    fail: bool,
}

impl MockPointer {
    /// Creates a recording pointer that accepts every action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pointer whose every action fails, for degradation tests.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<PointerCall> {
        self.calls.lock().expect("mock state poisoned").clone()
    }
}

impl PointerController for MockPointer {
    fn move_to(&self, x: i32, y: i32, _duration: Duration) -> Result<(), PointerError> {
        if self.fail {
            return Err(PointerError::InjectionFailed("synthetic failure".to_string()));
        }
        self.calls.lock().expect("mock state poisoned").push(PointerCall::MoveTo { x, y });
        Ok(())
    }

    fn click(&self) -> Result<(), PointerError> {
        if self.fail {
            return Err(PointerError::InjectionFailed("synthetic failure".to_string()));
        }
        self.calls.lock().expect("mock state poisoned").push(PointerCall::Click);
        Ok(())
    }
}
