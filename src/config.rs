// config.rs — persisted viewer settings

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::inertia::clamp_inertia;
use crate::orientation::FovLimits;

const CONFIG_FILE: &str = "pano360.json";

/// User-tunable settings, saved next to the executable as JSON. Loading
/// never fails: a missing or malformed file falls back to defaults, and
/// numeric fields are clamped rather than rejected, like every other input
/// in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub lang: String,
    pub inertia: f32,
    pub sensitivity: f32,
    pub gesture_control: bool,
    pub motion_control: bool,
    pub min_fov_deg: f32,
    pub max_fov_deg: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            inertia: 0.1,
            sensitivity: 1.0,
            gesture_control: true,
            motion_control: false,
            min_fov_deg: 20.0,
            max_fov_deg: 120.0,
        }
    }
}

impl ViewerConfig {
    pub fn sanitized(mut self) -> Self {
        self.inertia = clamp_inertia(self.inertia);
        self.sensitivity = if self.sensitivity.is_finite() {
            // same range the sensitivity slider offers
            self.sensitivity.clamp(0.1, 5.0)
        } else {
            1.0
        };
        // Sort and clamp in degree space; converting through radians and
        // back would drift the stored values a little on every cycle.
        let min = if self.min_fov_deg.is_finite() { self.min_fov_deg } else { 1.0 };
        let max = if self.max_fov_deg.is_finite() { self.max_fov_deg } else { 179.0 };
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.min_fov_deg = min.clamp(1.0, 179.0);
        self.max_fov_deg = max.clamp(1.0, 179.0);
        self
    }

    pub fn fov_limits(&self) -> FovLimits {
        FovLimits {
            min: self.min_fov_deg.to_radians(),
            max: self.max_fov_deg.to_radians(),
        }
        .sanitized()
    }

    pub fn load(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| match serde_json::from_str::<Self>(&text) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("ignoring malformed config {}: {e}", path.display());
                    None
                }
            });
        parsed.unwrap_or_default().sanitized()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, text)
    }

    /// `<exe dir>/pano360.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_sane() {
        let config = ViewerConfig::default();
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn json_round_trip() {
        let mut config = ViewerConfig::default();
        config.inertia = 0.4;
        config.motion_control = true;
        config.lang = "fr".to_string();

        let text = serde_json::to_string(&config).unwrap();
        let back: ViewerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let back: ViewerConfig = serde_json::from_str(r#"{"inertia": 0.9}"#).unwrap();
        assert_eq!(back.inertia, 0.9);
        assert_eq!(back.sensitivity, 1.0);
        assert!(back.gesture_control);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = ViewerConfig {
            inertia: 7.0,
            sensitivity: -3.0,
            min_fov_deg: 500.0,
            max_fov_deg: -10.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.inertia, 1.0);
        assert_eq!(config.sensitivity, 0.1);
        assert!(config.min_fov_deg <= config.max_fov_deg);
        let limits = config.fov_limits();
        assert!(limits.min >= 1.0f32.to_radians() - 1e-6);
        assert!(limits.max <= 179.0f32.to_radians() + 1e-6);
    }

    #[test]
    fn sanitization_is_idempotent() {
        // A load/save cycle must not nudge the stored bounds.
        let config = ViewerConfig {
            min_fov_deg: 30.0,
            max_fov_deg: 110.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.min_fov_deg, 30.0);
        assert_eq!(config.max_fov_deg, 110.0);
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = ViewerConfig::load(Path::new("/nonexistent/pano360.json"));
        assert_eq!(config, ViewerConfig::default());
    }
}
