//! Subtitle writers.

mod ass;

pub use ass::{escape_ass_text, format_ass_time, write_ass, PLAY_RES_X, PLAY_RES_Y};

use std::fs;
use std::path::Path;

use crate::subtitles::error::SubtitleError;
use crate::subtitles::types::{SubtitleCue, SubtitleStyle};

/// Write cues to an ASS file (UTF-8).
pub fn write_ass_file(
    path: &Path,
    cues: &[SubtitleCue],
    style: &SubtitleStyle,
) -> Result<(), SubtitleError> {
    fs::write(path, write_ass(cues, style)).map_err(|e| SubtitleError::write(path, e))
}
