//! Refresh-rate state shared between the refresh loop and the key
//! dispatcher.
//!
//! The rate is written from the deck's event context (preset cycling,
//! explicit set requests) and read by the mirror loop once per
//! iteration, so it lives in an atomic cell rather than behind a lock.
//! The loop recomputes its sleep budget from the cell every iteration,
//! which is what makes a rate change take effect on the very next tick
//! without restarting the loop.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

/// Cyclable refresh-rate presets in frames per second.
///
/// Key 0 advances through this list, wrapping after the last entry.
pub const RATE_PRESETS: [f64; 5] = [0.5, 1.0, 2.0, 5.0, 10.0];

/// Refresh rate the mirror starts with when the config does not say
/// otherwise.  Intentionally not a member of [`RATE_PRESETS`]: the first
/// preset cycle from a fresh start enters the list at its middle index.
pub const DEFAULT_RATE: f64 = 20.0;

/// Error type for refresh-rate change requests.
#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    /// The requested rate was zero, negative, NaN, or infinite.
    #[error("refresh rate must be a positive number of FPS, got {0}")]
    NotPositive(f64),
}

/// Returns the preset that follows `current` in the cycle.
///
/// If `current` is not exactly one of the presets, the cycle enters the
/// list at its middle index, so the first press lands on the preset
/// after the middle one.  Five consecutive cycles always return to the
/// entry value.
pub fn next_preset(current: f64) -> f64 {
    let index = RATE_PRESETS
        .iter()
        .position(|&p| p == current)
        .unwrap_or(RATE_PRESETS.len() / 2);
    RATE_PRESETS[(index + 1) % RATE_PRESETS.len()]
}

// ── SharedRate ────────────────────────────────────────────────────────────────

/// Lock-free shared refresh-rate cell.
///
/// Stores the `f64` bit pattern in an `AtomicU64`.  There is exactly one
/// writing context (the key dispatcher) and one reading context (the
/// refresh loop), so no read-modify-write invariant is needed beyond
/// single-value atomicity.
#[derive(Debug)]
pub struct SharedRate(AtomicU64);

impl SharedRate {
    /// Creates the cell with `initial` FPS.
    ///
    /// Callers validate the initial value (config loading falls back to
    /// [`DEFAULT_RATE`] for nonsense input).
    pub fn new(initial: f64) -> Self {
        Self(AtomicU64::new(initial.to_bits()))
    }

    /// Current rate in frames per second.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replaces the rate with `rate`.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NotPositive`] for non-positive or non-finite
    /// values; the previous rate is retained in that case.
    pub fn set(&self, rate: f64) -> Result<(), RateError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(RateError::NotPositive(rate));
        }
        self.0.store(rate.to_bits(), Ordering::Relaxed);
        debug!(rate, "refresh rate set");
        Ok(())
    }

    /// Advances to the next preset and returns the new rate.
    pub fn cycle(&self) -> f64 {
        let next = next_preset(self.get());
        self.0.store(next.to_bits(), Ordering::Relaxed);
        next
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_preset_advances_and_wraps() {
        assert_eq!(next_preset(0.5), 1.0);
        assert_eq!(next_preset(5.0), 10.0);
        assert_eq!(next_preset(10.0), 0.5);
    }

    #[test]
    fn test_next_preset_enters_at_middle_for_unknown_rate() {
        // Middle index is 2 (2.0 FPS), so an off-list rate cycles to 5.0.
        assert_eq!(next_preset(20.0), 5.0);
        assert_eq!(next_preset(3.7), 5.0);
    }

    #[test]
    fn test_cycling_from_any_start_always_lands_on_a_preset() {
        for start in [0.1, 0.5, 2.0, 7.5, 20.0, 144.0] {
            let rate = SharedRate::new(start);
            let cycled = rate.cycle();
            assert!(RATE_PRESETS.contains(&cycled), "{start} cycled to {cycled}");
        }
    }

    #[test]
    fn test_five_cycles_return_to_entry_value() {
        let rate = SharedRate::new(1.0);
        for _ in 0..RATE_PRESETS.len() {
            rate.cycle();
        }
        assert_eq!(rate.get(), 1.0);
    }

    #[test]
    fn test_set_rejects_zero_and_negative_and_keeps_previous() {
        let rate = SharedRate::new(2.0);

        assert_eq!(rate.set(0.0), Err(RateError::NotPositive(0.0)));
        assert_eq!(rate.set(-3.0), Err(RateError::NotPositive(-3.0)));
        assert_eq!(rate.get(), 2.0);
    }

    #[test]
    fn test_set_rejects_nan_and_infinity() {
        let rate = SharedRate::new(2.0);

        assert!(rate.set(f64::NAN).is_err());
        assert!(rate.set(f64::INFINITY).is_err());
        assert_eq!(rate.get(), 2.0);
    }

    #[test]
    fn test_set_accepts_positive_rate() {
        let rate = SharedRate::new(2.0);
        rate.set(30.0).expect("positive rate must be accepted");
        assert_eq!(rate.get(), 30.0);
    }
}
