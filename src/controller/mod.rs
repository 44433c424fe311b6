// controller — pluggable input sources driving one shared orientation

mod gesture;
mod motion;

pub use gesture::GestureController;
pub use motion::{AttitudeSample, MotionController, MotionSource};

use std::time::{Duration, Instant};

use glam::Vec2;

use crate::orientation::OrientationHandle;

/// Phase of a continuous pan/pinch gesture as delivered by the platform
/// gesture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
}

/// Uniform operations every input controller exposes, whatever its input
/// model. The hosting shell only needs these three knobs to coordinate a
/// controller; everything else stays private to the implementation.
pub trait Controller {
    /// Point the controller at a new orientation target. Rebinding always
    /// cancels whatever the controller had in flight against the old one.
    fn bind(&mut self, target: OrientationHandle);

    /// Inertia coefficient in [0, 1]; values outside are clamped.
    fn set_inertia(&mut self, inertia: f32);
    fn inertia(&self) -> f32;

    /// While disabled a controller ignores input entirely: nothing is
    /// buffered and nothing replays on re-enable.
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Gesture-driven controller surface consumed by the shell.
pub trait GestureControl: Controller {
    /// Viewport size in pixels, needed to turn pixel deltas into angles.
    fn set_viewport(&mut self, width: f32, height: f32);

    /// Screen-space input sensitivity multiplier.
    fn set_sensitivity(&mut self, sensitivity: f32);

    /// Pan gesture event. `delta_px` is the pointer movement since the last
    /// event; `now` stamps the event for release-velocity estimation.
    fn handle_pan(&mut self, phase: GesturePhase, delta_px: Vec2, now: Instant);

    /// Pinch scale factor relative to the last event; > 1 zooms in.
    fn handle_pinch(&mut self, scale: f32);

    /// Advance momentum by one frame. Never fires while disabled.
    fn tick(&mut self, dt: Duration);
}

/// Attitude-driven controller surface consumed by the shell.
pub trait MotionControl: Controller {
    /// Drain and apply pending sensor samples. No-op unless the controller
    /// is enabled and holds a live subscription.
    fn tick(&mut self);
}
