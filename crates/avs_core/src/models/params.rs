//! Generation parameters and their validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clip::scan_clips;
use super::enums::MediaKind;

/// Tolerance used when comparing speed multipliers against 1.0.
pub const SPEED_EPSILON: f64 = 1e-3;

/// Check whether a multiplier is effectively 1.0.
pub fn is_unit_speed(multiplier: f64) -> bool {
    (multiplier - 1.0).abs() <= SPEED_EPSILON
}

/// Invalid user-supplied parameters, detected before any tool runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("{name} must be greater than 0 (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{label} folder does not exist: {}", .path.display())]
    MissingDirectory { label: &'static str, path: PathBuf },

    #[error("{label} folder has no usable clips: {}", .path.display())]
    EmptyFolder { label: &'static str, path: PathBuf },

    #[error("cannot read {label} folder {}: {message}", .path.display())]
    UnreadableDirectory {
        label: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("{label} file does not exist: {}", .path.display())]
    MissingFile { label: &'static str, path: PathBuf },

    #[error("{label} has an unsupported extension: {} (expected {expected})", .path.display())]
    UnsupportedExtension {
        label: &'static str,
        path: PathBuf,
        expected: String,
    },
}

/// Subtitle options; subtitles are enabled when these are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleOptions {
    /// Folder holding per-clip transcripts named after the audio clips.
    pub transcript_dir: PathBuf,
    /// Font name written into the subtitle style.
    pub font_name: String,
    /// Font size written into the subtitle style.
    pub font_size: u32,
    /// Language hint for the speech-to-text fallback.
    pub language: Option<String>,
    /// Folder with font files handed to the burn-in filter.
    pub fonts_dir: Option<PathBuf>,
    /// Maximum characters per subtitle line.
    pub max_line_chars: usize,
}

/// Everything needed to generate one batch of outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Target output length in minutes.
    pub target_minutes: f64,
    /// Main video clip folder.
    pub main_dir: PathBuf,
    /// Background music folder.
    pub music_dir: PathBuf,
    /// Where outputs are written.
    pub output_dir: PathBuf,
    /// Video clip placed first in every output.
    pub first_video: Option<PathBuf>,
    /// Folder of opening clips used before the main pool.
    pub opening_dir: Option<PathBuf>,
    /// How many opening clips to use.
    pub opening_count: usize,
    /// Music track placed first in every output.
    pub first_music: Option<PathBuf>,
    /// Number of outputs to generate.
    pub count: usize,
    /// Global video speed multiplier.
    pub speed_multiplier: f64,
    /// Keep each clip's own audio and mix it under the music.
    pub keep_original_audio: bool,
    /// Global music tempo multiplier.
    pub audio_speed_multiplier: f64,
    /// Walk the music folder in name order instead of shuffling.
    pub sort_audio_by_name: bool,
    /// Subtitle options (`None` = no subtitles).
    pub subtitles: Option<SubtitleOptions>,
    /// Seed for the shuffle source (`None` = from entropy).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationParams {
    /// Target duration in whole milliseconds.
    pub fn target_ms(&self) -> u64 {
        (self.target_minutes * 60.0 * 1000.0) as u64
    }

    /// Target duration in seconds.
    pub fn target_secs(&self) -> f64 {
        self.target_ms() as f64 / 1000.0
    }

    /// Validate numeric ranges, paths and clip pools.
    ///
    /// The music and main video folders must hold at least one clip of
    /// their kind. An empty opening folder is allowed.
    pub fn validate(&self) -> Result<(), ParamError> {
        require_positive("target minutes", self.target_minutes)?;
        require_positive("output count", self.count as f64)?;
        require_positive("video speed multiplier", self.speed_multiplier)?;
        require_positive("audio speed multiplier", self.audio_speed_multiplier)?;

        require_pool("Main video", &self.main_dir, MediaKind::Video)?;
        require_pool("Music", &self.music_dir, MediaKind::Audio)?;
        if let Some(ref dir) = self.opening_dir {
            require_dir("Opening video", dir)?;
            count_clips("Opening video", dir, MediaKind::Video)?;
        }

        if let Some(ref path) = self.first_video {
            require_media_file("First video", path, MediaKind::Video)?;
        }
        if let Some(ref path) = self.first_music {
            require_media_file("First music", path, MediaKind::Audio)?;
        }

        if let Some(ref subs) = self.subtitles {
            require_dir("Transcript", &subs.transcript_dir)?;
            require_positive("subtitle font size", subs.font_size as f64)?;
            require_positive("subtitle line width", subs.max_line_chars as f64)?;
            if let Some(ref fonts) = subs.fonts_dir {
                require_dir("Fonts", fonts)?;
            }
        }

        Ok(())
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParamError::NotPositive { name, value })
    }
}

fn require_dir(label: &'static str, path: &Path) -> Result<(), ParamError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ParamError::MissingDirectory {
            label,
            path: path.to_path_buf(),
        })
    }
}

fn count_clips(label: &'static str, dir: &Path, kind: MediaKind) -> Result<usize, ParamError> {
    scan_clips(dir, kind)
        .map(|clips| clips.len())
        .map_err(|e| ParamError::UnreadableDirectory {
            label,
            path: dir.to_path_buf(),
            message: e.to_string(),
        })
}

fn require_pool(label: &'static str, dir: &Path, kind: MediaKind) -> Result<(), ParamError> {
    require_dir(label, dir)?;
    if count_clips(label, dir, kind)? == 0 {
        return Err(ParamError::EmptyFolder {
            label,
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

fn require_media_file(label: &'static str, path: &Path, kind: MediaKind) -> Result<(), ParamError> {
    if !path.is_file() {
        return Err(ParamError::MissingFile {
            label,
            path: path.to_path_buf(),
        });
    }
    if !kind.accepts(path) {
        return Err(ParamError::UnsupportedExtension {
            label,
            path: path.to_path_buf(),
            expected: kind.extensions().join(", "),
        });
    }
    Ok(())
}
