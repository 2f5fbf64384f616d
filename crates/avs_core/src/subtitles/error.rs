//! Subtitle error types.

use std::path::PathBuf;

/// Errors that can occur while building a subtitle track.
///
/// None of these abort an output; the run continues without subtitles.
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    /// Failed to read a transcript.
    #[error("Failed to read file '{}': {source}", .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the subtitle artifact.
    #[error("Failed to write file '{}': {source}", .path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No transcript matches an audio clip.
    #[error("No transcript named after '{clip}' in {}", .dir.display())]
    MissingTranscript { clip: String, dir: PathBuf },

    /// The offset table has no clips.
    #[error("No audio clips to align subtitles with")]
    NoClips,

    /// Speech-to-text failed.
    #[error("Transcription failed: {0}")]
    Transcription(String),
}

impl SubtitleError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }
}

