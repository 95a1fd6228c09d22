//! # Core Engine Module
//!
//! Startup configuration shared by every subsystem.

pub mod config;

pub use config::{CameraDefaults, Config, ConfigError, CullingConfig, EngineConfig, RenderLayerConfig};
