//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Kind of source media a clip refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// File extensions (lowercase, without dot) accepted for this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &["mp3", "wav", "flac"],
            MediaKind::Video => &["mp4", "mov", "mkv"],
        }
    }

    /// Check whether a path has an extension accepted for this kind.
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                self.extensions().iter().any(|allowed| *allowed == e)
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Pipeline stage, used for progress notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Building and exporting the background audio.
    Audio,
    /// Sourcing, re-timing and writing subtitles.
    Subtitles,
    /// Picking and trimming video clips.
    VideoSelection,
    /// Concatenating the selected video clips.
    Concat,
    /// Combining video with background audio.
    Mux,
    /// Rendering subtitles onto the video.
    Burn,
    /// The output finished.
    Complete,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Audio => "Audio",
            Stage::Subtitles => "Subtitles",
            Stage::VideoSelection => "Video Selection",
            Stage::Concat => "Concat",
            Stage::Mux => "Mux",
            Stage::Burn => "Burn Subtitles",
            Stage::Complete => "Complete",
        };
        write!(f, "{}", name)
    }
}
