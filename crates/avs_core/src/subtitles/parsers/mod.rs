//! Transcript parsers.
//!
//! Each parser is a pure function from file content to clip-local cues.

mod ass;
mod plain;
mod srt;

pub use ass::{parse_ass, parse_ass_time};
pub use plain::{parse_plain, split_into_phrases};
pub use srt::{parse_srt, parse_srt_time};

use crate::subtitles::reflow::reflow_cues;
use crate::subtitles::types::{SubtitleCue, TranscriptFormat};

/// Parse a transcript and re-wrap its text.
///
/// `clip_secs` is only used by plain text, which has no timing of its own.
pub fn parse_content(
    content: &str,
    format: TranscriptFormat,
    clip_secs: f64,
    max_chars: usize,
) -> Vec<SubtitleCue> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Vec::new();
    }

    let cues = match format {
        TranscriptFormat::Srt => parse_srt(content),
        TranscriptFormat::Ass => parse_ass(content),
        TranscriptFormat::PlainText => parse_plain(content, clip_secs, max_chars),
    };
    reflow_cues(cues, max_chars)
}
