//! Viewer configuration loaded from an optional TOML file

use std::path::{Path, PathBuf};

use log::info;
use nalgebra::Point3;
use serde::Deserialize;
use toycity_core::Camera;

/// Environment variable naming a config file to load instead of `toycity.toml`
pub const CONFIG_ENV: &str = "TOYCITY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "toycity.toml";

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target_fps: u32,
    /// City camera speed in world units per second
    pub move_speed: f32,
    /// Mesh viewer rotation speed in radians per second
    pub spin_speed: f32,
    /// City camera turn per look key press or per dragged cell
    pub look_step_degrees: f32,
    /// Field-of-view change per zoom key press or scroll notch
    pub zoom_step_degrees: f32,
    pub camera: CameraConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            move_speed: 10.0,
            spin_speed: 0.6,
            look_step_degrees: 3.0,
            zoom_step_degrees: 1.0,
            camera: CameraConfig::default(),
        }
    }
}

/// Starting camera for the city view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 3.0, 15.0],
            target: [0.0, 3.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> Camera {
        Camera {
            fov: self.fov_degrees.to_radians(),
            near: self.near,
            far: self.far,
            ..Camera::looking_at(Point3::from(self.position), Point3::from(self.target), aspect)
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// `$TOYCITY_CONFIG` if set, else `./toycity.toml` if present, else defaults
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            info!("loading config from {}", path.display());
            return Self::load(&path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            info!("loading config from {}", local.display());
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Frame budget implied by `target_fps`
    pub fn frame_time(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_toml_str(
            r#"
            target_fps = 60

            [camera]
            position = [1.0, 2.0, 3.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.camera.position, [1.0, 2.0, 3.0]);
        assert_eq!(config.camera.target, CameraConfig::default().target);
        assert_eq!(config.move_speed, AppConfig::default().move_speed);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("target_fps = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Path::new("/no/such/toycity.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_camera_build() {
        let camera = CameraConfig::default().build(2.0);
        assert_relative_eq!(camera.fov, std::f32::consts::FRAC_PI_4, epsilon = 1e-6);
        assert_eq!(camera.far, 200.0);
        assert_eq!(camera.position, Point3::new(0.0, 3.0, 15.0));
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_look_and_zoom_steps() {
        let config = AppConfig::from_toml_str("look_step_degrees = 5.0").unwrap();
        assert_eq!(config.look_step_degrees, 5.0);
        assert_eq!(config.zoom_step_degrees, 1.0);
    }

    #[test]
    fn test_frame_time() {
        let config = AppConfig {
            target_fps: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.frame_time(), std::time::Duration::from_secs(1));
    }
}
