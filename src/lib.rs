//! 360° panorama viewing engine: a shared camera orientation state driven
//! by pluggable gesture and motion controllers, an inertia integrator for
//! coasting, and a wgpu ray-cast renderer for equirectangular images.
//!
//! The [`viewer::Viewer`] ties one [`viewer::RenderSurface`] and both
//! controllers to a single [`orientation::OrientationHandle`] and owns the
//! appear/disappear lifecycle.

pub mod config;
pub mod controller;
pub mod i18n;
pub mod inertia;
pub mod orientation;
pub mod panorama;
pub mod renderer;
pub mod viewer;

pub use orientation::{FovLimits, OrientationHandle, OrientationSnapshot};
pub use viewer::{Viewer, Visibility, DEFAULT_INERTIA};
