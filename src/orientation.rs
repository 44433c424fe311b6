// orientation.rs — shared camera orientation/zoom state

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::{Arc, Mutex};

/// Pitch stays this far away from ±π/2 so the camera basis never degenerates
/// (±89.9°, same margin the renderer needs to keep tan(pitch) finite).
pub const PITCH_MARGIN: f32 = 0.001_745_3;

/// Default vertical field of view, ≈46.8° (a "normal" lens on full frame).
pub const DEFAULT_FOV: f32 = 0.816_814;

/// Allowed vertical field-of-view range, radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for FovLimits {
    fn default() -> Self {
        Self {
            min: 20.0f32.to_radians(),
            max: 120.0f32.to_radians(),
        }
    }
}

impl FovLimits {
    /// Sorts and bounds the pair so `min <= max` and both stay renderable.
    pub fn sanitized(self) -> Self {
        let floor = 1.0f32.to_radians();
        let ceil = 179.0f32.to_radians();
        let min = if self.min.is_finite() { self.min } else { floor };
        let max = if self.max.is_finite() { self.max } else { ceil };
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.clamp(floor, ceil),
            max: max.clamp(floor, ceil),
        }
    }
}

/// Read-only copy of the camera state, taken once per rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSnapshot {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

/// Camera yaw/pitch/fov with the wrapping and clamping rules applied on
/// every mutation. Yaw is kept in [-π, π), pitch strictly inside ±π/2, fov
/// inside the configured limits. Inputs are sanitized, never rejected:
/// non-finite values read as "no change".
#[derive(Debug, Clone)]
pub struct OrientationState {
    yaw: f32,
    pitch: f32,
    fov: f32,
    default_fov: f32,
    limits: FovLimits,
}

impl OrientationState {
    pub fn new(limits: FovLimits) -> Self {
        let limits = limits.sanitized();
        let default_fov = DEFAULT_FOV.clamp(limits.min, limits.max);
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: default_fov,
            default_fov,
            limits,
        }
    }

    pub fn apply_delta(&mut self, dyaw: f32, dpitch: f32, dfov: f32) {
        self.yaw = wrap_angle(self.yaw + finite_or_zero(dyaw));
        self.pitch = clamp_pitch(self.pitch + finite_or_zero(dpitch));
        self.fov = (self.fov + finite_or_zero(dfov)).clamp(self.limits.min, self.limits.max);
    }

    pub fn set_absolute(&mut self, yaw: f32, pitch: f32) {
        if yaw.is_finite() {
            self.yaw = wrap_angle(yaw);
        }
        if pitch.is_finite() {
            self.pitch = clamp_pitch(pitch);
        }
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.fov = self.default_fov;
    }

    pub fn snapshot(&self) -> OrientationSnapshot {
        OrientationSnapshot {
            yaw: self.yaw,
            pitch: self.pitch,
            fov: self.fov,
        }
    }
}

/// Shared handle to one camera's orientation state. Writers (the input
/// controllers) are serialized by the mutex; the render path takes the same
/// lock only long enough to copy a snapshot.
#[derive(Debug, Clone)]
pub struct OrientationHandle(Arc<Mutex<OrientationState>>);

impl OrientationHandle {
    pub fn new(limits: FovLimits) -> Self {
        Self(Arc::new(Mutex::new(OrientationState::new(limits))))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OrientationState> {
        // A poisoned lock only means a writer panicked mid-update; the state
        // is still clamped and usable.
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn apply_delta(&self, dyaw: f32, dpitch: f32, dfov: f32) {
        self.lock().apply_delta(dyaw, dpitch, dfov);
    }

    pub fn set_absolute(&self, yaw: f32, pitch: f32) {
        self.lock().set_absolute(yaw, pitch);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn snapshot(&self) -> OrientationSnapshot {
        self.lock().snapshot()
    }
}

/// Wrap an angle to [-π, π).
pub fn wrap_angle(a: f32) -> f32 {
    let wrapped = (a + PI).rem_euclid(TAU) - PI;
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Signed shortest-path difference `to - from`, in [-π, π).
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-FRAC_PI_2 + PITCH_MARGIN, FRAC_PI_2 - PITCH_MARGIN)
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> OrientationState {
        OrientationState::new(FovLimits::default())
    }

    #[test]
    fn yaw_wraps_shortest_path() {
        let mut s = state();
        s.set_absolute(3.13, 0.0);
        s.apply_delta(0.05, 0.0, 0.0);
        let yaw = s.snapshot().yaw;
        // 3.18 crosses the boundary and lands just past -π
        assert!((yaw - (3.18 - TAU)).abs() < 1e-5, "yaw = {yaw}");
        assert!((-PI..PI).contains(&yaw));
    }

    #[test]
    fn yaw_stays_canonical_under_large_deltas() {
        let mut s = state();
        s.apply_delta(100.0 * TAU + 1.0, 0.0, 0.0);
        let yaw = s.snapshot().yaw;
        assert!((yaw - 1.0).abs() < 1e-3, "yaw = {yaw}");
    }

    #[test]
    fn pitch_never_reaches_the_pole() {
        let mut s = state();
        for _ in 0..100 {
            s.apply_delta(0.0, 1.0, 0.0);
        }
        assert!(s.snapshot().pitch < FRAC_PI_2);
        s.set_absolute(0.0, -10.0);
        assert!(s.snapshot().pitch > -FRAC_PI_2);
        assert!((s.snapshot().pitch.abs() - (FRAC_PI_2 - PITCH_MARGIN)).abs() < 1e-6);
    }

    #[test]
    fn fov_respects_limits() {
        let mut s = state();
        s.apply_delta(0.0, 0.0, 100.0);
        assert!((s.snapshot().fov - FovLimits::default().max).abs() < 1e-6);
        s.apply_delta(0.0, 0.0, -100.0);
        assert!((s.snapshot().fov - FovLimits::default().min).abs() < 1e-6);
    }

    #[test]
    fn non_finite_inputs_are_ignored() {
        let mut s = state();
        let before = s.snapshot();
        s.apply_delta(f32::NAN, f32::INFINITY, f32::NEG_INFINITY);
        s.set_absolute(f32::NAN, f32::NAN);
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = state();
        s.apply_delta(1.0, 0.5, 0.3);
        s.reset();
        let snap = s.snapshot();
        assert_eq!(snap.yaw, 0.0);
        assert_eq!(snap.pitch, 0.0);
        assert!((snap.fov - DEFAULT_FOV).abs() < 1e-6);
    }

    #[test]
    fn inverted_limits_are_sorted() {
        let limits = FovLimits { min: 2.0, max: 0.5 }.sanitized();
        assert!(limits.min <= limits.max);
        assert!((limits.min - 0.5).abs() < 1e-6);
    }

    #[test]
    fn handle_serializes_writers() {
        let h = OrientationHandle::new(FovLimits::default());
        h.apply_delta(0.25, 0.1, 0.0);
        let h2 = h.clone();
        h2.set_absolute(1.0, 0.2);
        assert!((h.snapshot().yaw - 1.0).abs() < 1e-6);
    }
}
