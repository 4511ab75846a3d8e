use std::path::Path;

use glam::Vec3;
use momiji_assets::AssetCatalog;
use momiji_render::{AutoRotate, BokehPass};
use serde::{Deserialize, Serialize};

use crate::clock::ClockSettings;
use crate::environment::EnvironmentParameters;
use crate::error::ConfigError;

/// Everything the scene is built from. Loaded once, immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub catalog: AssetCatalog,
    pub environment: EnvironmentParameters,
    pub camera: CameraSettings,
    pub post: PostSettings,
    pub clock: ClockSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Scripted orbit. When absent the camera only moves with user input.
    pub auto_rotate: Option<AutoRotate>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 55.0,
            near: 1.0,
            far: 20000.0,
            position: Vec3::new(30.0, 30.0, 100.0),
            auto_rotate: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    /// Draw through the post-processing chain instead of directly.
    pub enabled: bool,
    pub bokeh: BokehPass,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bokeh: BokehPass::default(),
        }
    }
}

impl SceneConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let config: SceneConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&read()?)?,
            "json" => serde_json::from_str(&read()?)?,
            _ => return Err(ConfigError::UnsupportedFormat(ext)),
        };
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
