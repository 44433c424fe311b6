// inertia.rs — post-release momentum decay shared by both controllers

use std::time::Duration;

use glam::Vec2;

/// Exponent scale for the `k^dt` decay law. At 60 fps this maps inertia 0.1
/// to ≈46% retained velocity per frame (a short flick) and inertia 0.9 to
/// ≈96.5% (a long coast).
pub const DECAY_EXPONENT: f32 = 20.0;

/// Angular speed below which coasting stops, rad/s. Roughly half a degree
/// per second, well under what is visible.
pub const STOP_THRESHOLD: f32 = 0.01;

/// Inertia coefficients live in [0, 1]; anything else reads as "no inertia".
pub fn clamp_inertia(inertia: f32) -> f32 {
    if inertia.is_finite() {
        inertia.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fraction of angular velocity retained across `dt`.
///
/// `k = 0` kills the velocity outright, `k -> 1` loses almost nothing per
/// tick. The same curve parameterizes attitude smoothing in the motion
/// controller so the one user-facing inertia knob has a single feel.
pub fn decay_factor(inertia: f32, dt: Duration) -> f32 {
    let k = clamp_inertia(inertia);
    if k <= 0.0 {
        0.0
    } else {
        k.powf(dt.as_secs_f32() * DECAY_EXPONENT)
    }
}

/// Turns a one-shot release velocity into a decaying stream of yaw/pitch
/// deltas. Owned by the gesture controller as an `Option`; dropping or
/// overwriting it is the O(1) cancellation path.
#[derive(Debug, Clone)]
pub struct InertiaIntegrator {
    velocity: Vec2,
    inertia: f32,
}

impl InertiaIntegrator {
    /// `velocity` is the estimated yaw/pitch angular velocity at release,
    /// rad/s.
    pub fn new(velocity: Vec2, inertia: f32) -> Self {
        Self {
            velocity: if velocity.is_finite() { velocity } else { Vec2::ZERO },
            inertia: clamp_inertia(inertia),
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_settled(&self) -> bool {
        self.velocity.length() < STOP_THRESHOLD
    }

    /// Advance one tick: returns the yaw/pitch delta to apply for this tick,
    /// or `None` once the velocity has settled below the stop threshold.
    pub fn tick(&mut self, dt: Duration) -> Option<Vec2> {
        if self.is_settled() {
            return None;
        }
        let step = self.velocity * dt.as_secs_f32();
        self.velocity *= decay_factor(self.inertia, dt);
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_micros(16_667); // ~60 fps

    fn ticks_until_settled(inertia: f32) -> usize {
        let mut integrator = InertiaIntegrator::new(Vec2::new(1.0, 0.0), inertia);
        let mut ticks = 0;
        while integrator.tick(DT).is_some() {
            ticks += 1;
            assert!(ticks < 10_000, "inertia {inertia} never settled");
        }
        ticks
    }

    #[test]
    fn zero_inertia_settles_after_one_tick() {
        assert_eq!(ticks_until_settled(0.0), 1);
    }

    #[test]
    fn speed_is_monotonically_non_increasing() {
        let mut integrator = InertiaIntegrator::new(Vec2::new(2.0, -1.0), 0.7);
        let mut last = integrator.velocity().length();
        while integrator.tick(DT).is_some() {
            let speed = integrator.velocity().length();
            assert!(speed <= last);
            last = speed;
        }
        assert!(integrator.is_settled());
    }

    #[test]
    fn settle_time_increases_with_inertia() {
        let low = ticks_until_settled(0.1);
        let mid = ticks_until_settled(0.5);
        let high = ticks_until_settled(0.9);
        assert!(low < mid, "low={low} mid={mid}");
        assert!(mid < high, "mid={mid} high={high}");
    }

    #[test]
    fn low_inertia_release_stops_within_ten_ticks() {
        // inertia 0.1: decay starts on the very next tick and a 1 rad/s
        // release is fully stopped within ten frames.
        let ticks = ticks_until_settled(0.1);
        assert!(ticks >= 1 && ticks <= 10, "ticks = {ticks}");
    }

    #[test]
    fn coefficient_is_clamped() {
        let integrator = InertiaIntegrator::new(Vec2::X, 5.0);
        assert_eq!(integrator.inertia, 1.0);
        let integrator = InertiaIntegrator::new(Vec2::X, f32::NAN);
        assert_eq!(integrator.inertia, 0.0);
    }

    #[test]
    fn near_zero_release_produces_no_coast() {
        let mut integrator = InertiaIntegrator::new(Vec2::new(0.001, 0.0), 0.9);
        assert!(integrator.tick(DT).is_none());
    }

    #[test]
    fn decay_factor_endpoints() {
        assert_eq!(decay_factor(0.0, DT), 0.0);
        let near_one = decay_factor(0.999, DT);
        assert!(near_one > 0.999 && near_one < 1.0);
    }
}
