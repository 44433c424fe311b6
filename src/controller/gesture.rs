// gesture.rs — pan/pinch gestures → orientation deltas, with coasting

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::Vec2;
use log::trace;

use super::{Controller, GestureControl, GesturePhase};
use crate::inertia::{clamp_inertia, InertiaIntegrator, STOP_THRESHOLD};
use crate::orientation::OrientationHandle;

/// Pan samples older than this are ignored when estimating the release
/// velocity, so only the final flick counts.
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Drags shorter than this read as taps and produce no coast.
const MIN_FLICK_DURATION: Duration = Duration::from_millis(30);

/// Converts pan gestures into yaw/pitch deltas and pinch gestures into fov
/// deltas. While a drag is live the deltas go straight to the target; on
/// release the recent velocity is handed to an [`InertiaIntegrator`] which
/// the per-frame [`tick`](GestureControl::tick) then drains.
pub struct GestureController {
    target: Option<OrientationHandle>,
    inertia: f32,
    enabled: bool,
    sensitivity: f32,
    viewport: Vec2,
    samples: VecDeque<(Vec2, Instant)>,
    dragging: bool,
    coast: Option<InertiaIntegrator>,
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            target: None,
            inertia: 0.0,
            enabled: true,
            sensitivity: 1.0,
            viewport: Vec2::ZERO,
            samples: VecDeque::new(),
            dragging: false,
            coast: None,
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// True while momentum from a released drag is still being applied.
    pub fn is_coasting(&self) -> bool {
        self.coast.is_some()
    }

    /// Angle covered by one pixel of pointer travel, horizontally and
    /// vertically, at the current zoom. Derived from the vertical fov and
    /// the viewport aspect so rotation speed feels the same at every zoom
    /// level: a full-width drag always sweeps one horizontal field of view.
    fn angles_per_pixel(&self) -> Vec2 {
        let Some(target) = &self.target else {
            return Vec2::ZERO;
        };
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Vec2::ZERO;
        }
        let v_fov = target.snapshot().fov;
        let aspect = self.viewport.x / self.viewport.y;
        let h_fov = 2.0 * ((v_fov * 0.5).tan() * aspect).atan();
        Vec2::new(h_fov / self.viewport.x, v_fov / self.viewport.y)
    }

    fn release_velocity(&self, now: Instant) -> Vec2 {
        let oldest = self
            .samples
            .iter()
            .map(|(_, t)| *t)
            .find(|t| now.saturating_duration_since(*t) <= VELOCITY_WINDOW);
        let Some(oldest) = oldest else {
            return Vec2::ZERO;
        };
        let span = now.saturating_duration_since(oldest);
        if span < MIN_FLICK_DURATION {
            return Vec2::ZERO;
        }
        let travel: Vec2 = self
            .samples
            .iter()
            .filter(|(_, t)| now.saturating_duration_since(*t) <= VELOCITY_WINDOW)
            .map(|(d, _)| *d)
            .sum();
        travel / span.as_secs_f32()
    }

    fn cancel_coast(&mut self) {
        self.coast = None;
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for GestureController {
    fn bind(&mut self, target: OrientationHandle) {
        self.cancel_coast();
        self.dragging = false;
        self.samples.clear();
        self.target = Some(target);
    }

    fn set_inertia(&mut self, inertia: f32) {
        self.inertia = clamp_inertia(inertia);
    }

    fn inertia(&self) -> f32 {
        self.inertia
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel_coast();
            self.dragging = false;
            self.samples.clear();
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl GestureControl for GestureController {
    fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    fn set_sensitivity(&mut self, sensitivity: f32) {
        if sensitivity.is_finite() && sensitivity > 0.0 {
            self.sensitivity = sensitivity;
        }
    }

    fn handle_pan(&mut self, phase: GesturePhase, delta_px: Vec2, now: Instant) {
        if !self.enabled {
            return;
        }
        match phase {
            GesturePhase::Began => {
                // Direct input always preempts momentum.
                self.cancel_coast();
                self.dragging = true;
                self.samples.clear();
            }
            GesturePhase::Changed => {
                if !self.dragging || !delta_px.is_finite() {
                    return;
                }
                let per_px = self.angles_per_pixel();
                // Dragging right pulls the panorama right, turning the view left.
                let delta = -delta_px * per_px * self.sensitivity;
                if let Some(target) = &self.target {
                    target.apply_delta(delta.x, delta.y, 0.0);
                }
                self.samples.push_back((delta, now));
                while let Some((_, t)) = self.samples.front() {
                    if now.saturating_duration_since(*t) > VELOCITY_WINDOW {
                        self.samples.pop_front();
                    } else {
                        break;
                    }
                }
            }
            GesturePhase::Ended => {
                if !self.dragging {
                    return;
                }
                self.dragging = false;
                let velocity = self.release_velocity(now);
                self.samples.clear();
                if velocity.length() >= STOP_THRESHOLD {
                    trace!("drag released at {velocity:?} rad/s, inertia {}", self.inertia);
                    self.coast = Some(InertiaIntegrator::new(velocity, self.inertia));
                }
            }
        }
    }

    fn handle_pinch(&mut self, scale: f32) {
        if !self.enabled || !scale.is_finite() || scale <= 0.0 {
            return;
        }
        if let Some(target) = &self.target {
            // Pinch-out (scale > 1) narrows the field of view: zoom in.
            let fov = target.snapshot().fov;
            target.apply_delta(0.0, 0.0, fov / scale - fov);
        }
    }

    fn tick(&mut self, dt: Duration) {
        if !self.enabled || self.dragging {
            return;
        }
        let Some(coast) = &mut self.coast else {
            return;
        };
        match coast.tick(dt) {
            Some(step) => {
                if let Some(target) = &self.target {
                    target.apply_delta(step.x, step.y, 0.0);
                }
            }
            None => self.cancel_coast(),
        }
    }
}
