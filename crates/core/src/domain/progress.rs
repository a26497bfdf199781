// Progress throttling
//
// Raw (current, total) callbacks arrive far more often than the user wants
// to see them; only whole 10% steps are forwarded, and never twice.

use std::sync::atomic::{AtomicI64, Ordering};

/// Quantize a raw progress pair into a percentage worth reporting.
///
/// Returns `Some(pct)` only when `floor(current * 100 / total)` is a multiple
/// of 10. `total == 0` yields `None`.
pub fn quantize(current: u64, total: u64) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let pct = u128::from(current) * 100 / u128::from(total);
    if pct % 10 != 0 {
        return None;
    }
    u32::try_from(pct).ok()
}

/// Last percentage reported for one job.
#[derive(Debug)]
pub struct ProgressState {
    last: AtomicI64,
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(-1),
        }
    }

    /// Feed a raw progress pair; returns the percentage to push, if any.
    ///
    /// Only strictly increasing percentages (capped at 100) pass, so repeated
    /// or out-of-order callbacks never reach the sink.
    pub fn accept(&self, current: u64, total: u64) -> Option<u32> {
        let pct = quantize(current, total)?;
        if pct > 100 {
            return None;
        }
        let previous = self.last.fetch_max(i64::from(pct), Ordering::SeqCst);
        (i64::from(pct) > previous).then_some(pct)
    }

    /// Last reported percentage
    pub fn last_reported(&self) -> Option<u32> {
        u32::try_from(self.last.load(Ordering::SeqCst)).ok()
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_multiples_of_ten() {
        for total in [1u64, 3, 7, 10, 99, 100, 1000, 4_294_967_311] {
            for current in (0..=total).step_by(((total / 37) + 1) as usize) {
                let floor = current * 100 / total;
                let expected = (floor % 10 == 0).then_some(floor as u32);
                assert_eq!(quantize(current, total), expected, "{current}/{total}");
            }
        }
    }

    #[test]
    fn test_quantize_zero_total() {
        assert_eq!(quantize(0, 0), None);
        assert_eq!(quantize(42, 0), None);
    }

    #[test]
    fn test_quantize_floor() {
        assert_eq!(quantize(19, 100), None);
        assert_eq!(quantize(20, 100), Some(20));
        assert_eq!(quantize(209, 1000), Some(20));
        assert_eq!(quantize(100, 100), Some(100));
        assert_eq!(quantize(0, 100), Some(0));
    }

    #[test]
    fn test_quantize_no_overflow() {
        assert_eq!(quantize(u64::MAX, u64::MAX), Some(100));
    }

    #[test]
    fn test_progress_state_suppresses_repeats() {
        let state = ProgressState::new();
        assert_eq!(state.accept(0, 100), Some(0));
        assert_eq!(state.accept(0, 100), None);
        assert_eq!(state.accept(5, 100), None);
        assert_eq!(state.accept(10, 100), Some(10));
        assert_eq!(state.accept(10, 100), None);
        assert_eq!(state.last_reported(), Some(10));
    }

    #[test]
    fn test_progress_state_never_decreases() {
        let state = ProgressState::new();
        assert_eq!(state.accept(50, 100), Some(50));
        assert_eq!(state.accept(30, 100), None);
        assert_eq!(state.accept(60, 100), Some(60));
    }

    #[test]
    fn test_progress_state_ignores_overshoot() {
        let state = ProgressState::new();
        assert_eq!(state.accept(200, 100), None);
        assert_eq!(state.last_reported(), None);
    }
}
