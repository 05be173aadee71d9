//! Offline time decay — converts wall-clock absence into effective seconds.
//!
//! The first day away counts at full rate. The following six days count at a
//! rate that falls linearly from full speed to zero, so total offline gain is
//! capped no matter how long the player stays away.

/// Seconds of absence that accrue at full rate (one day).
pub const FULL_SPEED_WINDOW: f64 = 86_400.0;

/// Seconds over which the accrual rate decays linearly to zero (six days).
pub const DECAY_WINDOW: f64 = 518_400.0;

/// Effective simulated seconds for `elapsed` wall-clock seconds.
///
/// Negative elapsed time (clock skew, out-of-order requests) yields zero.
/// Inside the decay window the contribution is the integral of a rate that
/// falls linearly from 1 to 0: `extra - extra^2 / (2 * DECAY_WINDOW)`.
pub fn effective_seconds(elapsed: f64) -> f64 {
    if elapsed <= 0.0 {
        return 0.0;
    }
    if elapsed <= FULL_SPEED_WINDOW {
        return elapsed;
    }
    let extra = (elapsed - FULL_SPEED_WINDOW).min(DECAY_WINDOW);
    FULL_SPEED_WINDOW + extra - extra * extra / (2.0 * DECAY_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_elapsed_is_zero() {
        assert_eq!(effective_seconds(-1000.0), 0.0);
    }

    #[test]
    fn test_full_speed_up_to_window() {
        assert_eq!(effective_seconds(1.0), 1.0);
        assert_eq!(effective_seconds(3600.0), 3600.0);
        assert_eq!(effective_seconds(FULL_SPEED_WINDOW), FULL_SPEED_WINDOW);
    }

    #[test]
    fn test_decay_window_runs_below_real_time() {
        let elapsed = FULL_SPEED_WINDOW + DECAY_WINDOW / 2.0;
        let effective = effective_seconds(elapsed);
        assert!(effective < elapsed);
        assert!(effective > FULL_SPEED_WINDOW);
    }

    #[test]
    fn test_capped_after_decay_window() {
        let cap = effective_seconds(FULL_SPEED_WINDOW + DECAY_WINDOW);
        assert_eq!(effective_seconds(FULL_SPEED_WINDOW + DECAY_WINDOW * 3.0), cap);
        // total cap is the full window plus the integral of the decay ramp
        assert_eq!(cap, FULL_SPEED_WINDOW + DECAY_WINDOW / 2.0);
    }

    #[test]
    fn test_monotonic_nondecreasing() {
        let mut last = 0.0;
        for step in 0..200 {
            let effective = effective_seconds(step as f64 * 5000.0);
            assert!(effective >= last);
            last = effective;
        }
    }
}
