//! # Engine Configuration
//!
//! Configuration structures for the engine and its subsystems. Every struct is
//! serializable, so a whole [`EngineConfig`] can be loaded from a `.toml` or
//! `.ron` file through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Window**: title and initial drawable size
//! - **Renderer**: camera ordering and empty-frame diagnostics
//! - **Resources**: defaults applied when meshes and textures are created

use serde::{Deserialize, Serialize};

use crate::assets::mesh::MeshCacheOption;
use crate::assets::texture::TextureOptions;

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
}

impl WindowConfig {
    /// Create a window configuration
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Window size must be non-zero, got {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Scene Engine", 800, 600)
    }
}

/// # Renderer Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Render larger camera viewports first
    pub sort_cameras_by_area: bool,
    /// Warn when drawables are submitted in a frame without any camera
    pub warn_on_empty_frame: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sort_cameras_by_area: true,
            warn_on_empty_frame: true,
        }
    }
}

/// # Resource Configuration
///
/// Defaults used when a creation call does not specify its own options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceConfig {
    /// Cache option for meshes created without one
    pub default_mesh_cache: MeshCacheOption,
    /// Options for textures created without any
    pub default_texture_options: TextureOptions,
}

/// # Complete Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Resource manager settings
    pub resources: ResourceConfig,
}

impl EngineConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            renderer: RendererConfig::default(),
            resources: ResourceConfig::default(),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set window settings
    #[must_use]
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Set renderer settings
    #[must_use]
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set resource defaults
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.resources = resources;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("Unknown log level '{}'", self.log_level)));
        }
        self.window.validate().map_err(ConfigError::Invalid)?;

        let texture = &self.resources.default_texture_options;
        if !(1..=4).contains(&texture.channels) {
            return Err(ConfigError::Invalid(format!(
                "Default texture channel count must be 1-4, got {}",
                texture.channels
            )));
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
