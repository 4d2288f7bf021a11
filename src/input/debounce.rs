//! Acceptance-window gate.
//!
//! A held button produces the same [`InputUpdate`] every tick. The gate
//! admits the first one and suppresses identical repeats until the window
//! has elapsed since the last admitted update.

use super::InputUpdate;

/// Default acceptance window (ms).
pub const DEFAULT_WINDOW_MS: f64 = 20.0;

/// Debounce gate for repeated identical updates.
#[derive(Clone, Debug)]
pub struct Debounce {
    window: f64,
    last: Option<InputUpdate>,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl Debounce {
    /// Create a gate with the given window (ms).
    pub fn new(window: f64) -> Self {
        Self {
            window: window.max(0.0),
            last: None,
        }
    }

    /// Acceptance window (ms).
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Decide whether `update` passes. Admitted updates restart the window.
    pub fn admit(&mut self, update: &InputUpdate) -> bool {
        if let Some(last) = &self.last {
            let elapsed = update.timestamp - last.timestamp;
            if last == update && elapsed <= self.window {
                return false;
            }
        }
        self.last = Some(update.clone());
        true
    }

    /// Forget the last admitted update.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::movement::{Action, HorizontalMovement, VerticalMovement};

    fn attack(at: f64) -> InputUpdate {
        InputUpdate::new(HorizontalMovement::Stationary, VerticalMovement::Stationary, [Action::Attack], at)
    }

    #[test]
    fn test_repeat_within_window_is_suppressed() {
        let mut gate = Debounce::new(20.0);
        let mut fired = 0;
        for update in [attack(0.0), attack(16.0)] {
            if gate.admit(&update) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_repeat_outside_window_passes() {
        let mut gate = Debounce::new(20.0);
        let mut fired = 0;
        for update in [attack(0.0), attack(33.0)] {
            if gate.admit(&update) {
                fired += 1;
            }
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_different_update_always_passes() {
        let mut gate = Debounce::new(50.0);
        assert!(gate.admit(&attack(0.0)));
        assert!(gate.admit(&InputUpdate::idle(1.0)));
        assert!(gate.admit(&attack(2.0)));
    }

    #[test]
    fn test_window_measured_from_last_admitted() {
        let mut gate = Debounce::new(20.0);
        assert!(gate.admit(&attack(0.0)));
        assert!(!gate.admit(&attack(10.0)));
        assert!(!gate.admit(&attack(20.0)));
        assert!(gate.admit(&attack(21.0)));
        assert!(!gate.admit(&attack(30.0)));
    }

    #[test]
    fn test_reset() {
        let mut gate = Debounce::default();
        assert_eq!(gate.window(), DEFAULT_WINDOW_MS);
        assert!(gate.admit(&attack(0.0)));
        gate.reset();
        assert!(gate.admit(&attack(1.0)));
    }
}
