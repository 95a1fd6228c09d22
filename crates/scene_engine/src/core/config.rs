//! # Engine Configuration
//!
//! One serializable tree with the settings the scene core reads at startup:
//! logging, culling policy, the defaults new cameras are built from, the
//! render layer table and the camera controller profile.
//!
//! ```toml
//! log_level = "debug"
//! render_target = [1280, 720]
//!
//! [camera.projection]
//! type = "Perspective"
//! fov_y = 60.0
//! aspect_ratio = 1.777
//! near = 0.1
//! far = 500.0
//!
//! [[render_layers]]
//! name = "world"
//! order = 1
//! ```
//!
//! Every section has defaults, so partial files are fine. Call
//! [`EngineConfig::validate`] after loading.

use crate::render::camera::CameraOptions;
use crate::render::camera_controller::ControllerProfile;
use crate::render::projection::Projection;
use crate::render::viewport::Viewport;
use crate::scene::render_layer::DEFAULT_LAYERS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use crate::config::{Config, ConfigError};

/// Visibility settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Turn frustum culling on for newly created cameras
    pub frustum_culling: bool,
    /// Reorder each camera's draw list by sort key after generation
    pub sort_commands: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            sort_commands: false,
        }
    }
}

/// Defaults for cameras created by the scene manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDefaults {
    /// Projection
    pub projection: Projection,
    /// Viewport
    pub viewport: Viewport,
    /// Option flags; frustum culling is overridden by [`CullingConfig`]
    pub options: CameraOptions,
    /// Layers subscribed by name
    pub render_layers: Vec<String>,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            viewport: Viewport::full(),
            options: CameraOptions::default(),
            render_layers: DEFAULT_LAYERS.iter().map(|(name, _)| (*name).to_string()).collect(),
        }
    }
}

/// One entry of the render layer table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderLayerConfig {
    /// Unique name
    pub name: String,
    /// Draw order, lower first
    pub order: i32,
}

impl RenderLayerConfig {
    /// Create a layer entry
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self { name: name.into(), order }
    }
}

/// # Engine Configuration
///
/// Core engine behavior configuration including logging, debug features,
/// and the scene defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level or `env_logger` filter directive
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Initial render target size in pixels
    pub render_target: (u32, u32),
    /// Fixed frame step in seconds; wall time when unset
    pub fixed_time_step: Option<f32>,
    /// Visibility settings
    pub culling: CullingConfig,
    /// Camera defaults
    pub camera: CameraDefaults,
    /// Render layer table
    pub render_layers: Vec<RenderLayerConfig>,
    /// Camera controller response
    pub controller: ControllerProfile,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            render_target: (1280, 720),
            fixed_time_step: None,
            culling: CullingConfig::default(),
            camera: CameraDefaults::default(),
            render_layers: DEFAULT_LAYERS
                .iter()
                .map(|(name, order)| RenderLayerConfig::new(*name, *order))
                .collect(),
            controller: ControllerProfile::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Set the initial render target size
    pub fn with_render_target(mut self, width: u32, height: u32) -> Self {
        self.render_target = (width, height);
        self
    }

    /// Advance frames by a fixed step instead of wall time
    pub fn with_fixed_time_step(mut self, step: f32) -> Self {
        self.fixed_time_step = Some(step);
        self
    }

    /// Replace the render layer table
    pub fn with_render_layers(mut self, layers: Vec<RenderLayerConfig>) -> Self {
        self.render_layers = layers;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let directive = self.log_level.contains('=');
        if !directive && self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        if self.render_target.0 == 0 || self.render_target.1 == 0 {
            return Err(ConfigError::Invalid(format!(
                "render target {}x{} has no area",
                self.render_target.0, self.render_target.1
            )));
        }
        if let Some(step) = self.fixed_time_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(ConfigError::Invalid(format!("fixed time step {step} must be positive")));
            }
        }

        self.camera
            .projection
            .validate()
            .and_then(|()| self.camera.viewport.validate())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut names = HashSet::new();
        for layer in &self.render_layers {
            if layer.name.is_empty() {
                return Err(ConfigError::Invalid("render layer with an empty name".to_string()));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(ConfigError::Invalid(format!("render layer '{}' listed twice", layer.name)));
            }
        }
        for name in &self.camera.render_layers {
            if !names.contains(name.as_str()) {
                log::warn!("Camera default layer '{}' is not in the render layer table", name);
            }
        }

        let profile = &self.controller;
        if !(profile.translate_speed.is_finite() && profile.rotate_speed.is_finite()) {
            return Err(ConfigError::Invalid("controller speeds must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.render_layers.len(), 4);
        assert_eq!(config.render_layers[0], RenderLayerConfig::new("skybox", 0));
        assert!(config.culling.frustum_culling);
    }

    #[test]
    fn test_rejects_bad_values() {
        let duplicate = EngineConfig::default()
            .with_render_layers(vec![RenderLayerConfig::new("world", 0), RenderLayerConfig::new("world", 1)]);
        assert!(matches!(duplicate.validate(), Err(ConfigError::Invalid(_))));

        let no_area = EngineConfig::default().with_render_target(0, 10);
        assert!(no_area.validate().is_err());

        let level = EngineConfig::default().with_log_level("loud");
        assert!(level.validate().is_err());

        let mut projection = EngineConfig::default();
        projection.camera.projection = Projection::Perspective { fov_y: 0.0, aspect_ratio: 1.0, near: 0.1, far: 10.0 };
        assert!(projection.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            log_level = "debug"
            render_target = [640, 480]

            [[render_layers]]
            name = "world"
            order = 0
        "#;
        let config = EngineConfig::from_str_as(text, ConfigFormat::Toml).expect("parses");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.render_target, (640, 480));
        assert_eq!(config.render_layers, vec![RenderLayerConfig::new("world", 0)]);
        assert_eq!(config.controller, ControllerProfile::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_and_toml_round_trip() {
        let config = EngineConfig::default().with_fixed_time_step(0.5).with_debug(true);
        for format in [ConfigFormat::Json, ConfigFormat::Toml] {
            let text = config.to_string_as(format).expect("serializes");
            let parsed = EngineConfig::from_str_as(&text, format).expect("parses");
            assert_eq!(parsed, config);
        }
    }
}
