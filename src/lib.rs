//! scenegl - an entity-component scene graph driving an OpenGL pipeline
//!
//! # Features
//! - GPU resource lifecycle: vertex buffers, textures, multi-render-target
//!   framebuffers and shader programs, each with explicit status and errors
//! - Resource managers for meshes, textures, shaders and sounds
//! - Bevy ECS based scene with transforms, cameras and behaviour scripts
//! - Per-frame draw orchestration against the primary camera
//! - Platform-agnostic input with a winit translation layer
//! - WAV decoding and positional sound sources
//!
//! All GPU access goes through a [`gl::GlDevice`]; [`gl::HeadlessDevice`]
//! runs the whole engine without a display.

pub mod audio;
pub mod engine;
pub mod gl;
pub mod import;
pub mod input;
pub mod logging;
pub mod render;
pub mod resources;
pub mod scene;

// Re-export Bevy ECS prelude for users
pub use bevy_ecs::prelude::*;

pub use engine::{Engine, FrameClock};
pub use gl::{GlContext, GlDevice};
pub use render::{RenderError, Renderer};
pub use scene::{Camera, Name, Scene, Transform, ViewSettings};

use crate::logging::LoggingConfig;
use crate::resources::ResourceDirectories;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {message}")]
    Io { path: String, message: String },
    #[error("Invalid engine config: {0}")]
    Parse(String),
}

/// Configuration for initializing the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// RGBA colour the default framebuffer is cleared to
    pub clear_color: [f32; 4],
    /// Logical resource directories, id to path
    pub directories: ResourceDirectories,
    /// View settings of cameras spawned by the engine
    pub camera: ViewSettings,
    /// Interval between sweeps of finished sound playbacks
    pub sweep_interval_ms: u64,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "scenegl".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            directories: ResourceDirectories::new(),
            camera: ViewSettings::default(),
            sweep_interval_ms: audio::DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&json)?;
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
