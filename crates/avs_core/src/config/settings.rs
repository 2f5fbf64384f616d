//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;
use crate::subtitles::DEFAULT_MAX_LINE_CHARS;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Output and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Per-run log behaviour.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Defaults for generation flags not given on the command line.
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Subtitle defaults.
    #[serde(default)]
    pub subtitles: SubtitleSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,
}

/// Path configuration for outputs and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder used when `--output` is not given.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "stitched_output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Number of tool output lines to show when a command fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    10
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    /// Per-run logger configuration for these settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            compact: self.compact,
            progress_step: self.progress_step.max(1),
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
            ..LogConfig::default()
        }
    }
}

/// Generation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Opening clips used when an opening folder is given.
    #[serde(default = "default_opening_count")]
    pub opening_count: usize,

    /// Video speed multiplier.
    #[serde(default = "default_multiplier")]
    pub speed_multiplier: f64,

    /// Music tempo multiplier.
    #[serde(default = "default_multiplier")]
    pub audio_speed_multiplier: f64,

    /// Mix each clip's own audio under the music.
    #[serde(default)]
    pub keep_original_audio: bool,

    /// Walk the music folder in name order.
    #[serde(default)]
    pub sort_audio_by_name: bool,

    /// Outputs per batch.
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_opening_count() -> usize {
    8
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_count() -> usize {
    1
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            opening_count: default_opening_count(),
            speed_multiplier: default_multiplier(),
            audio_speed_multiplier: default_multiplier(),
            keep_original_audio: false,
            sort_audio_by_name: false,
            count: default_count(),
        }
    }
}

/// Subtitle defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSettings {
    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Maximum characters per subtitle line.
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,

    /// Language hint for transcription (empty = auto-detect).
    #[serde(default)]
    pub language: String,

    /// Folder with font files for burn-in (empty = system fonts).
    #[serde(default)]
    pub fonts_dir: String,
}

fn default_font_name() -> String {
    "ZY Oliver".to_string()
}

fn default_font_size() -> u32 {
    64
}

fn default_max_line_chars() -> usize {
    DEFAULT_MAX_LINE_CHARS
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            font_name: default_font_name(),
            font_size: default_font_size(),
            max_line_chars: default_max_line_chars(),
            language: String::new(),
            fonts_dir: String::new(),
        }
    }
}

/// External tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_whisper")]
    pub whisper: String,

    /// Model name passed to `whisper --model`.
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_whisper() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            whisper: default_whisper(),
            whisper_model: default_whisper_model(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Generation,
    Subtitles,
    Tools,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Generation,
        ConfigSection::Subtitles,
        ConfigSection::Tools,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Generation => "generation",
            ConfigSection::Subtitles => "subtitles",
            ConfigSection::Tools => "tools",
        }
    }

    /// Comment written above the table in a fresh config file.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log directories",
            ConfigSection::Logging => "Per-run log files",
            ConfigSection::Generation => "Defaults for `generate` flags",
            ConfigSection::Subtitles => "Subtitle style and transcription",
            ConfigSection::Tools => "External tools",
        }
    }
}

impl FromStr for ConfigSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|section| section.table_name() == name)
            .ok_or_else(|| format!("unknown config section '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        for section in ConfigSection::ALL {
            assert!(toml.contains(&format!("[{}]", section.table_name())));
        }
        assert!(toml.contains("font_name = \"ZY Oliver\""));
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.generation.speed_multiplier = 1.25;
        settings.tools.ffmpeg = "/opt/ffmpeg/bin/ffmpeg".to_string();

        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\noutput_folder = \"custom_output\"\n[subtitles]\nfont_size = 48";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom value preserved
        assert_eq!(parsed.paths.output_folder, "custom_output");
        assert_eq!(parsed.subtitles.font_size, 48);
        // Defaults applied for missing
        assert!(parsed.logging.compact);
        assert_eq!(parsed.subtitles.font_name, "ZY Oliver");
        assert_eq!(parsed.generation.opening_count, 8);
        assert_eq!(parsed.tools.whisper_model, "base");
    }

    #[test]
    fn section_names_parse() {
        assert_eq!("Tools".parse::<ConfigSection>(), Ok(ConfigSection::Tools));
        assert!("analysis".parse::<ConfigSection>().is_err());
    }

    #[test]
    fn log_config_from_settings() {
        let logging = LoggingSettings {
            progress_step: 0,
            ..LoggingSettings::default()
        };
        let config = logging.to_log_config();
        assert_eq!(config.progress_step, 1);
        assert_eq!(config.error_tail, 20);
    }
}
