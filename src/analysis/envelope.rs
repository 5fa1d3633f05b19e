// Envelope shaping - rolling average plus a rate-limited follower
//
// Two independent smoothing layers damp per-tick jitter from the raw
// estimator, trading latency for stability:
//
// 1. RollingAverage keeps a fixed ring of recent raw targets and hands the
//    follower the mean of the newest `smoothing_window` entries.
// 2. EnvelopeFollower approaches that averaged target using the configured
//    strategy: asymmetric rise/fall rates scaled by delta time, or a
//    single exponential blend.
//
// Both carry state across ticks and are owned by exactly one engine.

use crate::config::{Smoothing, MAX_SMOOTHING_WINDOW};

/// Fixed-capacity ring of recent raw targets
#[derive(Debug)]
pub struct RollingAverage {
    ring: [f32; MAX_SMOOTHING_WINDOW],
    /// Next write slot, in `[0, MAX_SMOOTHING_WINDOW)`
    cursor: usize,
}

impl Default for RollingAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingAverage {
    pub fn new() -> Self {
        Self {
            ring: [0.0; MAX_SMOOTHING_WINDOW],
            cursor: 0,
        }
    }

    /// Record this tick's raw target and return the mean of the most
    /// recent `window` entries
    ///
    /// `window` is clamped to the ring capacity. The ring starts
    /// zero-filled, so the first few ticks average against zeros and ramp
    /// in rather than jumping.
    pub fn push(&mut self, target: f32, window: usize) -> f32 {
        let len = self.ring.len();
        self.ring[self.cursor] = target;
        self.cursor = (self.cursor + 1) % len;

        let window = window.clamp(1, len);
        let mut sum = 0.0;
        for i in 0..window {
            // Walk backwards from the slot just written
            let idx = (self.cursor + 2 * len - 1 - i) % len;
            sum += self.ring[idx];
        }
        sum / window as f32
    }

    pub fn reset(&mut self) {
        self.ring = [0.0; MAX_SMOOTHING_WINDOW];
        self.cursor = 0;
    }
}

/// Stateful level follower
#[derive(Debug, Default)]
pub struct EnvelopeFollower {
    level: f32,
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current shaped level, in `[0, 1]`
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Advance one tick toward `target`
    ///
    /// With `Smoothing::RiseFall` the level moves linearly at the rise
    /// rate when climbing and the fall rate when dropping, bounded by
    /// `rate * dt` so it can never overshoot the target. With
    /// `Smoothing::Exponential` the level blends toward the target in one
    /// step, keeping `factor` of the previous value.
    pub fn advance(&mut self, target: f32, dt: f32, smoothing: Smoothing) -> f32 {
        match smoothing {
            Smoothing::RiseFall { rise, fall } => {
                let speed = if target > self.level { rise } else { fall };
                self.level = move_toward(self.level, target, speed * dt);
            }
            Smoothing::Exponential { factor } => {
                self.level = target + (self.level - target) * factor;
            }
        }
        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }
}

/// Step `current` toward `target` by at most `max_delta`, landing exactly
/// on the target once within range
fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_toward_never_overshoots() {
        assert_eq!(move_toward(0.0, 1.0, 0.3), 0.3);
        assert_eq!(move_toward(0.9, 1.0, 0.3), 1.0);
        assert_eq!(move_toward(1.0, 0.0, 0.4), 0.6);
        assert_eq!(move_toward(0.2, 0.2, 0.1), 0.2);
    }

    #[test]
    fn test_rise_and_fall_rates_are_independent() {
        let mut follower = EnvelopeFollower::new();
        let smoothing = Smoothing::RiseFall {
            rise: 10.0,
            fall: 5.0,
        };
        let dt = 0.01;

        let after_rise = follower.advance(1.0, dt, smoothing);
        assert!((after_rise - 0.1).abs() < 1e-6);

        let after_fall = follower.advance(0.0, dt, smoothing);
        assert!((after_fall - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_follower_converges_and_holds() {
        let mut follower = EnvelopeFollower::new();
        let smoothing = Smoothing::RiseFall {
            rise: 10.0,
            fall: 5.0,
        };

        for _ in 0..100 {
            follower.advance(0.7, 1.0 / 60.0, smoothing);
        }
        assert!((follower.level() - 0.7).abs() < 1e-6);

        // A further tick at the target must not move the level
        let held = follower.advance(0.7, 1.0 / 60.0, smoothing);
        assert_eq!(held, 0.7);
    }

    #[test]
    fn test_level_bounds_hold_for_any_target() {
        let mut follower = EnvelopeFollower::new();
        let smoothing = Smoothing::RiseFall {
            rise: 30.0,
            fall: 30.0,
        };

        for _ in 0..10 {
            let level = follower.advance(5.0, 1.0, smoothing);
            assert!((0.0..=1.0).contains(&level));
        }
        for _ in 0..10 {
            let level = follower.advance(-3.0, 1.0, smoothing);
            assert!((0.0..=1.0).contains(&level));
        }
    }

    #[test]
    fn test_exponential_blend() {
        let mut follower = EnvelopeFollower::new();
        let smoothing = Smoothing::Exponential { factor: 0.5 };

        // Halves the distance to the target each tick
        assert!((follower.advance(1.0, 1.0 / 60.0, smoothing) - 0.5).abs() < 1e-6);
        assert!((follower.advance(1.0, 1.0 / 60.0, smoothing) - 0.75).abs() < 1e-6);

        // factor 0 snaps straight to the target
        let mut snappy = EnvelopeFollower::new();
        assert_eq!(
            snappy.advance(0.4, 1.0 / 60.0, Smoothing::Exponential { factor: 0.0 }),
            0.4
        );
    }

    #[test]
    fn test_rolling_average_window_of_one_passes_through() {
        let mut avg = RollingAverage::new();
        assert_eq!(avg.push(0.8, 1), 0.8);
        assert_eq!(avg.push(0.2, 1), 0.2);
    }

    #[test]
    fn test_rolling_average_means_recent_entries() {
        let mut avg = RollingAverage::new();
        avg.push(0.3, 3);
        avg.push(0.6, 3);
        let mean = avg.push(0.9, 3);
        assert!((mean - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_rolling_average_wraps_ring() {
        let mut avg = RollingAverage::new();
        // Fill well past one revolution of the 30-slot ring
        for i in 0..95 {
            avg.push(i as f32, 1);
        }
        // Mean of the last 5 targets: 91 through 95
        let mean = avg.push(95.0, 5);
        assert!((mean - 93.0).abs() < 1e-4);
    }

    #[test]
    fn test_rolling_average_warm_up_ramps_in() {
        let mut avg = RollingAverage::new();
        // First tick averages one real target against four zero slots
        let mean = avg.push(1.0, 5);
        assert!((mean - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_rolling_average_oversized_window_clamped() {
        let mut avg = RollingAverage::new();
        let mean = avg.push(MAX_SMOOTHING_WINDOW as f32, MAX_SMOOTHING_WINDOW * 4);
        assert!((mean - 1.0).abs() < 1e-6);
    }
}
