//! Subtitle synchronisation.
//!
//! Builds a subtitle track for the stitched audio and writes it as ASS for
//! burn-in.
//!
//! # Components
//!
//! - **types**: cues, transcript formats and the caption style
//! - **parsers**: SRT, ASS and plain-text transcript parsers
//! - **reflow**: line wrapping and interval clean-up
//! - **stitch**: per-clip transcripts remapped onto the playlist timeline
//! - **transcribe**: speech-to-text fallback for the whole audio export
//! - **writers**: ASS output
//!
//! # Usage
//!
//! ```ignore
//! use avs_core::subtitles::{build_subtitle_track, write_ass_file, SubtitleStyle};
//!
//! let (cues, _source) = build_subtitle_track(&dir, &offsets, &audio, None, &whisper, 40);
//! write_ass_file(&out, &cues, &SubtitleStyle::caption("ZY Oliver", 64))?;
//! ```

mod error;
pub mod parsers;
pub mod reflow;
mod stitch;
mod transcribe;
mod types;
pub mod writers;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::ClipOffsetTable;

pub use error::SubtitleError;
pub use parsers::{parse_ass, parse_content, parse_plain, parse_srt};
pub use reflow::{reflow_cues, wrap_line, DEFAULT_MAX_LINE_CHARS};
pub use stitch::{find_matching_transcript, load_transcript, stitch_from_clips};
pub use transcribe::{clean_segments, transcribe_and_refine, Transcriber, WhisperCli};
pub use types::{AssColor, SubtitleCue, SubtitleStyle, TranscriptFormat, MIN_CUE_SECS};
pub use writers::{format_ass_time, write_ass, write_ass_file};

#[cfg(test)]
pub(crate) use transcribe::testing::CannedTranscriber;

/// Where the cues of a track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueSource {
    Transcripts,
    Transcription,
}

/// Build the global cue list for one output.
///
/// Per-clip transcripts are tried first. If any clip lacks one, the whole
/// audio export is transcribed instead. Returns an empty list when neither
/// path yields cues; failures are logged, never returned.
pub fn build_subtitle_track(
    transcript_dir: &Path,
    offsets: &ClipOffsetTable,
    audio_export: &Path,
    language: Option<&str>,
    transcriber: &dyn Transcriber,
    max_chars: usize,
) -> (Vec<SubtitleCue>, Option<CueSource>) {
    match stitch_from_clips(transcript_dir, offsets, max_chars) {
        Ok(cues) if !cues.is_empty() => return (cues, Some(CueSource::Transcripts)),
        Ok(_) => tracing::info!("Transcripts contain no cues, falling back to transcription"),
        Err(e) => tracing::info!("{}, falling back to transcription", e),
    }

    match transcribe_and_refine(transcriber, audio_export, language, max_chars) {
        Ok(cues) if !cues.is_empty() => (cues, Some(CueSource::Transcription)),
        Ok(_) => (Vec::new(), None),
        Err(e) => {
            tracing::warn!("{}", e);
            (Vec::new(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Clip;
    use std::fs;
    use tempfile::TempDir;

    fn table() -> ClipOffsetTable {
        let mut table = ClipOffsetTable::new();
        table.push(Clip::audio("/m/a.mp3"), 5.0);
        table
    }

    #[test]
    fn prefers_transcripts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.srt"), "00:00:01,000 --> 00:00:02,000\nA\n").unwrap();
        let canned = CannedTranscriber::new(vec![SubtitleCue::new(0.0, 1.0, "whisper")]);

        let (cues, source) =
            build_subtitle_track(dir.path(), &table(), Path::new("bgm.mp3"), None, &canned, 40);
        assert_eq!(source, Some(CueSource::Transcripts));
        assert_eq!(cues, vec![SubtitleCue::new(1.0, 2.0, "A")]);
        assert!(canned.languages.lock().is_empty());
    }

    #[test]
    fn falls_back_to_transcription() {
        let dir = TempDir::new().unwrap();
        let canned = CannedTranscriber::new(vec![SubtitleCue::new(0.0, 1.0, "whisper")]);

        let (cues, source) = build_subtitle_track(
            dir.path(),
            &table(),
            Path::new("bgm.mp3"),
            Some("en"),
            &canned,
            40,
        );
        assert_eq!(source, Some(CueSource::Transcription));
        assert_eq!(cues[0].text, "whisper");
        assert_eq!(*canned.languages.lock(), vec![Some("en".to_string())]);
    }

    #[test]
    fn nothing_found_is_empty() {
        let dir = TempDir::new().unwrap();
        let canned = CannedTranscriber::new(Vec::new());
        let (cues, source) =
            build_subtitle_track(dir.path(), &table(), Path::new("bgm.mp3"), None, &canned, 40);
        assert!(cues.is_empty());
        assert_eq!(source, None);
    }
}
