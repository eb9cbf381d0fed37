//! Configuration for mcpbridge.
//!
//! This crate provides utilities for:
//! - Resolving the OpenCode, Claude Code and skills config file locations.
//! - Reading environment overrides and the optional `settings.json`.

pub mod env;
pub mod settings;

pub use env::{app_dir, env_json_output, env_path, home_dir, settings_file};
pub use settings::{load_settings, load_settings_from, ConfigPaths, Settings};
