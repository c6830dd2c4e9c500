//! # Core Engine Module
//!
//! Shared configuration for the engine's subsystems.

pub mod config;

pub use config::{Config, ConfigError, EngineConfig, RendererConfig, ResourceConfig, WindowConfig};
