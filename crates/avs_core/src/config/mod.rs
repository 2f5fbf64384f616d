//! Configuration management for AV Stitcher.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Repair on load: unknown sections dropped, missing keys defaulted
//!
//! # Example
//!
//! ```no_run
//! use avs_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_folder);
//!
//! config.settings_mut().subtitles.font_size = 56;
//! config.update_section(ConfigSection::Subtitles).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, GenerationSettings, LoggingSettings, PathSettings, Settings, SubtitleSettings,
    ToolSettings,
};
