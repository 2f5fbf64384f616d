//! Clip references into the source pools.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::MediaKind;

/// A reference to one source media file.
///
/// The probed duration is not stored here; it is looked up lazily through a
/// [`crate::media::ProbeCache`] so every path is probed at most once per run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clip {
    /// Path to the source file.
    pub path: PathBuf,
    /// Audio or video.
    pub kind: MediaKind,
}

impl Clip {
    /// Create a clip of the given kind.
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create an audio clip.
    pub fn audio(path: impl Into<PathBuf>) -> Self {
        Self::new(path, MediaKind::Audio)
    }

    /// Create a video clip.
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self::new(path, MediaKind::Video)
    }

    /// File name for display (falls back to the full path).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File stem, used to match transcripts to audio clips.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Clip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// List the clips of one kind in a directory, sorted by path.
///
/// Extension matching is case-insensitive. Subdirectories are not walked.
pub fn scan_clips(dir: &Path, kind: MediaKind) -> io::Result<Vec<Clip>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && kind.accepts(path))
        .collect();

    paths.sort();

    Ok(paths.into_iter().map(|p| Clip::new(p, kind)).collect())
}
