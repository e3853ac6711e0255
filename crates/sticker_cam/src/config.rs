use std::fs;
use std::path::Path;

use anyhow::Context;
use face_sticker::{CompositorConfig, PoseConfig};
use serde::{Deserialize, Serialize};

/// Tuning loaded from an optional JSON file. Missing fields keep their
/// defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pose: PoseConfig,
    pub compositor: CompositorConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_is_default() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.pose.max_yaw, 50.0);
        assert!(config.compositor.capture);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = AppConfig::from_json(r#"{
            "pose": {"roll_bias": 0.0, "max_yaw": 40.0},
            "compositor": {"debug_points": true}
        }"#).unwrap();
        assert_eq!(config.pose.roll_bias, 0.0);
        assert_eq!(config.pose.max_yaw, 40.0);
        assert_eq!(config.pose.pitch_gain, 1.5);
        assert!(config.compositor.debug_points);
        assert_eq!(config.compositor.point_size, 4.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/sticker-cam.json"))).is_err());
    }
}
