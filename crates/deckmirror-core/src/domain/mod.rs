//! Pure domain logic: no OS, HID, or capture dependencies.

pub mod refresh;
pub mod regions;
