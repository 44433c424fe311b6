// viewer.rs — owns the orientation state, both controllers, and the
// visibility lifecycle (the Rust analogue of Image360's hosting controller)

use std::time::Duration;

use log::debug;

use crate::controller::{
    GestureControl, GestureController, MotionControl, MotionController,
};
use crate::inertia::clamp_inertia;
use crate::orientation::{FovLimits, OrientationHandle, OrientationSnapshot};

/// Default pan-gesture inertia, matching the feel of the original viewer.
pub const DEFAULT_INERTIA: f32 = 0.1;

/// Boundary to the rendering collaborator. The viewer rebinds the
/// orientation source on construction and drives the texture lifecycle from
/// its own appear/disappear transitions; everything else about rendering is
/// the surface's business.
pub trait RenderSurface {
    fn bind_orientation(&mut self, orientation: OrientationHandle);
    fn load_textures(&mut self);
    fn unload_textures(&mut self);
}

/// View lifecycle phase. Sensor subscriptions are expensive, so the motion
/// controller may only hold one while `Appeared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    NotAppeared,
    Appeared,
    Disappeared,
}

/// Coordinates one render surface, one gesture controller and one motion
/// controller over a single shared orientation state.
///
/// The two controllers carry independent inertia coefficients; the viewer
/// keeps them synchronized to its single `inertia` knob. The motion-enabled
/// flag is two-slot state: the live controller flag while the view is
/// visible, a preserved preference otherwise, so the user's choice survives
/// the sensor teardown on disappear.
pub struct Viewer<S: RenderSurface> {
    surface: S,
    orientation: OrientationHandle,
    gesture: Box<dyn GestureControl>,
    motion: Box<dyn MotionControl>,
    inertia: f32,
    visibility: Visibility,
    preserved_motion_enabled: bool,
}

impl<S: RenderSurface> Viewer<S> {
    pub fn new(mut surface: S, fov_limits: FovLimits) -> Self {
        let orientation = OrientationHandle::new(fov_limits);
        surface.bind_orientation(orientation.clone());

        let mut gesture: Box<dyn GestureControl> = Box::new(GestureController::new());
        let mut motion: Box<dyn MotionControl> = Box::new(MotionController::new());
        gesture.bind(orientation.clone());
        motion.bind(orientation.clone());

        let preserved_motion_enabled = motion.is_enabled();
        let mut viewer = Self {
            surface,
            orientation,
            gesture,
            motion,
            inertia: 0.0,
            visibility: Visibility::NotAppeared,
            preserved_motion_enabled,
        };
        viewer.set_inertia(DEFAULT_INERTIA);
        viewer
    }

    // MARK: inertia

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Clamped to [0, 1] and fanned out to both controllers.
    pub fn set_inertia(&mut self, inertia: f32) {
        self.inertia = clamp_inertia(inertia);
        self.gesture.set_inertia(self.inertia);
        self.motion.set_inertia(self.inertia);
    }

    // MARK: gesture control

    pub fn gesture_control_enabled(&self) -> bool {
        self.gesture.is_enabled()
    }

    pub fn set_gesture_control_enabled(&mut self, enabled: bool) {
        self.gesture.set_enabled(enabled);
    }

    pub fn gesture_mut(&mut self) -> &mut dyn GestureControl {
        self.gesture.as_mut()
    }

    /// Replace the gesture controller wholesale. The new instance is bound
    /// to the current orientation target and inherits the inertia knob.
    pub fn set_gesture_controller(&mut self, mut controller: Box<dyn GestureControl>) {
        controller.bind(self.orientation.clone());
        controller.set_inertia(self.inertia);
        self.gesture = controller;
    }

    // MARK: motion control

    /// One consistent boolean regardless of visibility phase: the live flag
    /// while appeared, the preserved preference otherwise.
    pub fn motion_control_enabled(&self) -> bool {
        if self.visibility == Visibility::Appeared {
            self.motion.is_enabled()
        } else {
            self.preserved_motion_enabled
        }
    }

    pub fn set_motion_control_enabled(&mut self, enabled: bool) {
        if self.visibility == Visibility::Appeared {
            self.motion.set_enabled(enabled);
        } else {
            self.preserved_motion_enabled = enabled;
        }
    }

    /// Replace the motion controller wholesale. The new instance is bound,
    /// inherits the inertia knob, adopts its own enabled flag as the new
    /// preference, and gets the visibility gate re-applied: off-screen
    /// controllers never hold the sensor.
    pub fn set_motion_controller(&mut self, mut controller: Box<dyn MotionControl>) {
        controller.bind(self.orientation.clone());
        controller.set_inertia(self.inertia);
        self.preserved_motion_enabled = controller.is_enabled();
        if self.visibility != Visibility::Appeared {
            controller.set_enabled(false);
        }
        self.motion = controller;
    }

    // MARK: lifecycle

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The view became visible: load textures and restore the preserved
    /// motion preference (acquiring the sensor if it was on).
    pub fn view_appeared(&mut self) {
        if self.visibility == Visibility::Appeared {
            return;
        }
        debug!("view appeared, restoring motion preference: {}", self.preserved_motion_enabled);
        self.surface.load_textures();
        self.motion.set_enabled(self.preserved_motion_enabled);
        self.visibility = Visibility::Appeared;
    }

    /// The view went off screen: unload textures, snapshot the live motion
    /// flag into the preference, and force the sensor subscription down.
    pub fn view_disappeared(&mut self) {
        if self.visibility != Visibility::Appeared {
            return;
        }
        self.surface.unload_textures();
        self.preserved_motion_enabled = self.motion.is_enabled();
        self.motion.set_enabled(false);
        self.visibility = Visibility::Disappeared;
        debug!("view disappeared, preserved motion preference: {}", self.preserved_motion_enabled);
    }

    // MARK: frame

    /// Advance both controllers by one frame on the event-loop timeline.
    pub fn tick(&mut self, dt: Duration) {
        self.gesture.tick(dt);
        self.motion.tick();
    }

    pub fn orientation(&self) -> OrientationHandle {
        self.orientation.clone()
    }

    pub fn snapshot(&self) -> OrientationSnapshot {
        self.orientation.snapshot()
    }

    pub fn reset_view(&mut self) {
        self.orientation.reset();
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
