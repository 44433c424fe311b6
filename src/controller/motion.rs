// motion.rs — device attitude → absolute orientation, with smoothing

use std::time::Instant;

use glam::{Quat, Vec2, Vec3};
use log::debug;

use super::{Controller, MotionControl};
use crate::inertia::{clamp_inertia, decay_factor};
use crate::orientation::{shortest_arc, OrientationHandle};

/// One absolute device-attitude estimate from the platform motion layer:
/// the device's rotation relative to the fixed gravity/north frame, plus a
/// monotonic timestamp.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeSample {
    pub attitude: Quat,
    pub timestamp: Instant,
}

impl AttitudeSample {
    pub fn new(attitude: Quat, timestamp: Instant) -> Self {
        Self { attitude, timestamp }
    }

    /// Yaw/pitch of the device's forward axis (-Z) in the reference frame.
    /// Roll is discarded; the panorama view stays level.
    pub fn yaw_pitch(&self) -> Vec2 {
        let forward = self.attitude * Vec3::NEG_Z;
        let yaw = (-forward.x).atan2(-forward.z);
        let pitch = forward.y.clamp(-1.0, 1.0).asin();
        Vec2::new(yaw, pitch)
    }
}

/// Platform motion-sensing boundary.
///
/// The subscription is the one real hardware resource in this crate:
/// `start` acquires it and reports whether it is live, `stop` releases it.
/// On a device without the sensor there is simply no source to install and
/// enabling motion control becomes a silent no-op.
pub trait MotionSource: Send {
    fn start(&mut self) -> bool;
    fn stop(&mut self);
    /// Next pending sample, oldest first, or `None` when drained.
    fn poll(&mut self) -> Option<AttitudeSample>;
}

/// Tracks the device attitude into absolute yaw/pitch. Raw sensor attitude
/// is noisy and can jump on device re-orientation, so each sample is folded
/// through an exponential smoothing filter before it reaches the target.
/// The filter lag is driven by the same inertia coefficient that controls
/// gesture coasting; there is no momentum once samples stop.
pub struct MotionController {
    target: Option<OrientationHandle>,
    source: Option<Box<dyn MotionSource>>,
    inertia: f32,
    enabled: bool,
    subscribed: bool,
    smoothed: Option<(Vec2, Instant)>,
}

impl MotionController {
    /// Controller for a device without an attitude sensor: the enabled flag
    /// is honored and reported but no samples will ever arrive.
    pub fn new() -> Self {
        Self {
            target: None,
            source: None,
            inertia: 0.0,
            enabled: false,
            subscribed: false,
            smoothed: None,
        }
    }

    pub fn with_source(source: Box<dyn MotionSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::new()
        }
    }

    /// True while the hardware subscription is held.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Fold one attitude sample into the smoothed orientation and push it to
    /// the target. Public so a platform layer that delivers samples by
    /// callback can bypass `poll`.
    pub fn handle_sample(&mut self, sample: AttitudeSample) {
        if !self.enabled {
            return;
        }
        let raw = sample.yaw_pitch();
        if !raw.is_finite() {
            return;
        }
        let next = match self.smoothed {
            // First sample after (re)subscribing: jump straight to it.
            None => raw,
            Some((prev, prev_t)) => {
                let dt = sample.timestamp.saturating_duration_since(prev_t);
                let alpha = 1.0 - decay_factor(self.inertia, dt);
                Vec2::new(
                    prev.x + shortest_arc(prev.x, raw.x) * alpha,
                    prev.y + (raw.y - prev.y) * alpha,
                )
            }
        };
        self.smoothed = Some((next, sample.timestamp));
        if let Some(target) = &self.target {
            target.set_absolute(next.x, next.y);
        }
    }

    fn acquire(&mut self) {
        if self.subscribed {
            return;
        }
        if let Some(source) = &mut self.source {
            self.subscribed = source.start();
            debug!("motion subscription acquired: {}", self.subscribed);
        }
    }

    fn release(&mut self) {
        if self.subscribed {
            if let Some(source) = &mut self.source {
                source.stop();
            }
            self.subscribed = false;
            debug!("motion subscription released");
        }
        self.smoothed = None;
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for MotionController {
    fn bind(&mut self, target: OrientationHandle) {
        self.smoothed = None;
        self.target = Some(target);
    }

    fn set_inertia(&mut self, inertia: f32) {
        self.inertia = clamp_inertia(inertia);
    }

    fn inertia(&self) -> f32 {
        self.inertia
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.acquire();
        } else {
            self.release();
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl MotionControl for MotionController {
    fn tick(&mut self) {
        if !self.enabled || !self.subscribed {
            return;
        }
        while let Some(sample) = self.source.as_mut().and_then(|s| s.poll()) {
            self.handle_sample(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::orientation::FovLimits;

    const SAMPLE_DT: Duration = Duration::from_micros(16_667);

    #[derive(Default)]
    struct SourceProbe {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    struct FakeSource {
        probe: Arc<SourceProbe>,
        queue: Arc<Mutex<VecDeque<AttitudeSample>>>,
    }

    impl FakeSource {
        fn new() -> (Self, Arc<SourceProbe>, Arc<Mutex<VecDeque<AttitudeSample>>>) {
            let probe = Arc::new(SourceProbe::default());
            let queue = Arc::new(Mutex::new(VecDeque::new()));
            (
                Self {
                    probe: probe.clone(),
                    queue: queue.clone(),
                },
                probe,
                queue,
            )
        }
    }

    impl MotionSource for FakeSource {
        fn start(&mut self) -> bool {
            self.probe.starts.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn stop(&mut self) {
            self.probe.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn poll(&mut self) -> Option<AttitudeSample> {
            self.queue.lock().unwrap().pop_front()
        }
    }

    fn yaw_sample(yaw: f32, at: Instant) -> AttitudeSample {
        AttitudeSample::new(Quat::from_rotation_y(yaw), at)
    }

    #[test]
    fn attitude_extraction_matches_rotation() {
        let base = Instant::now();
        let s = yaw_sample(0.5, base);
        assert!((s.yaw_pitch().x - 0.5).abs() < 1e-5);

        let s = AttitudeSample::new(Quat::from_rotation_x(0.3), base);
        assert!((s.yaw_pitch().y - 0.3).abs() < 1e-5);
    }

    #[test]
    fn enable_acquires_and_disable_releases() {
        let (source, probe, _) = FakeSource::new();
        let mut controller = MotionController::with_source(Box::new(source));
        assert_eq!(probe.starts.load(Ordering::SeqCst), 0);

        controller.set_enabled(true);
        assert!(controller.is_subscribed());
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);

        // Redundant enable must not re-acquire.
        controller.set_enabled(true);
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);

        controller.set_enabled(false);
        assert!(!controller.is_subscribed());
        assert_eq!(probe.stops.load(Ordering::SeqCst), 1);

        // Re-enable re-acquires instead of reusing a stale handle.
        controller.set_enabled(true);
        assert_eq!(probe.starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sensorless_device_is_a_silent_no_op() {
        let mut controller = MotionController::new();
        controller.bind(OrientationHandle::new(FovLimits::default()));
        controller.set_enabled(true);
        assert!(controller.is_enabled());
        assert!(!controller.is_subscribed());
        controller.tick();
    }

    #[test]
    fn zero_inertia_tracks_directly() {
        let handle = OrientationHandle::new(FovLimits::default());
        let mut controller = MotionController::new();
        controller.bind(handle.clone());
        controller.set_inertia(0.0);
        // No source: feed samples through the callback path.
        controller.enabled = true;

        let base = Instant::now();
        controller.handle_sample(yaw_sample(0.4, base));
        controller.handle_sample(yaw_sample(0.8, base + SAMPLE_DT));
        assert!((handle.snapshot().yaw - 0.8).abs() < 1e-5);
    }

    #[test]
    fn high_inertia_smooths_oscillation_toward_the_mean() {
        let handle = OrientationHandle::new(FovLimits::default());
        let mut controller = MotionController::new();
        controller.bind(handle.clone());
        controller.set_inertia(0.9);
        controller.enabled = true;

        // ±2° oscillation around a 30° mean at sensor rate.
        let mean = 30.0f32.to_radians();
        let amp = 2.0f32.to_radians();
        let base = Instant::now();
        controller.handle_sample(yaw_sample(mean, base));
        let mut worst = 0.0f32;
        for i in 1..=240u32 {
            let target = mean + if i % 2 == 0 { amp } else { -amp };
            controller.handle_sample(yaw_sample(target, base + SAMPLE_DT * i));
            if i > 60 {
                worst = worst.max((handle.snapshot().yaw - mean).abs());
            }
        }
        // Output hugs the mean instead of passing the ±2° input through.
        assert!(worst < amp * 0.25, "worst deviation {worst} vs amplitude {amp}");
    }

    #[test]
    fn smoothed_yaw_crosses_the_wrap_seam_cleanly() {
        let handle = OrientationHandle::new(FovLimits::default());
        let mut controller = MotionController::new();
        controller.bind(handle.clone());
        controller.set_inertia(0.5);
        controller.enabled = true;

        let base = Instant::now();
        controller.handle_sample(yaw_sample(3.1, base));
        controller.handle_sample(yaw_sample(-3.1, base + SAMPLE_DT));
        // Shortest path from 3.1 to -3.1 goes forward through π, so the
        // smoothed value moves past 3.1 rather than swinging back through 0.
        let yaw = handle.snapshot().yaw;
        assert!(yaw > 3.1 || yaw < -3.1, "yaw = {yaw}");
    }

    #[test]
    fn disabled_controller_drops_samples() {
        let handle = OrientationHandle::new(FovLimits::default());
        let mut controller = MotionController::new();
        controller.bind(handle.clone());
        controller.handle_sample(yaw_sample(1.0, Instant::now()));
        assert_eq!(handle.snapshot().yaw, 0.0);
    }

    #[test]
    fn tick_drains_the_source_queue() {
        let (source, _, queue) = FakeSource::new();
        let handle = OrientationHandle::new(FovLimits::default());
        let mut controller = MotionController::with_source(Box::new(source));
        controller.bind(handle.clone());
        controller.set_inertia(0.0);
        controller.set_enabled(true);

        let base = Instant::now();
        {
            let mut q = queue.lock().unwrap();
            q.push_back(yaw_sample(0.2, base));
            q.push_back(yaw_sample(0.4, base + SAMPLE_DT));
        }
        controller.tick();
        assert!((handle.snapshot().yaw - 0.4).abs() < 1e-5);
        assert!(queue.lock().unwrap().is_empty());
    }
}
