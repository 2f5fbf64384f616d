//! Per-clip transcript stitching.
//!
//! Every audio clip in the playlist is paired with a transcript of the same
//! base name. The transcripts are parsed, moved onto the playlist timeline
//! and concatenated in playlist order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ClipOffsetTable;

use super::error::SubtitleError;
use super::parsers::parse_content;
use super::types::{SubtitleCue, TranscriptFormat, MIN_CUE_SECS};

/// Find the transcript for `clip_path` in `dir`.
///
/// Exact `<stem>.srt`, `<stem>.ass` and `<stem>.txt` win over a
/// case-insensitive stem match.
pub fn find_matching_transcript(dir: &Path, clip_path: &Path) -> Result<PathBuf, SubtitleError> {
    let stem = clip_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let missing = || SubtitleError::MissingTranscript {
        clip: clip_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| clip_path.display().to_string()),
        dir: dir.to_path_buf(),
    };

    if stem.is_empty() {
        return Err(missing());
    }

    for format in TranscriptFormat::ALL {
        let candidate = dir.join(format!("{}.{}", stem, format.extension()));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let entries = fs::read_dir(dir).map_err(|e| SubtitleError::read(dir, e))?;
    let wanted = stem.to_lowercase();
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && TranscriptFormat::from_path(path).is_some())
        .filter(|path| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_lowercase() == wanted)
                .unwrap_or(false)
        })
        .collect();

    // read_dir order is platform dependent
    matches.sort_by_key(|path| {
        TranscriptFormat::from_path(path)
            .and_then(|f| TranscriptFormat::ALL.iter().position(|x| *x == f))
            .unwrap_or(usize::MAX)
    });
    matches.into_iter().next().ok_or_else(missing)
}

/// Read and parse one transcript into clip-local cues.
///
/// `clip_secs` is the clip's source duration, used to spread plain text.
pub fn load_transcript(
    path: &Path,
    clip_secs: f64,
    max_chars: usize,
) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let content = fs::read_to_string(path).map_err(|e| SubtitleError::read(path, e))?;
    let format = TranscriptFormat::from_path(path).unwrap_or(TranscriptFormat::PlainText);
    Ok(parse_content(&content, format, clip_secs, max_chars))
}

/// Build global cues for a playlist from per-clip transcripts.
///
/// Fails as a whole if any clip lacks a readable transcript.
pub fn stitch_from_clips(
    transcript_dir: &Path,
    table: &ClipOffsetTable,
    max_chars: usize,
) -> Result<Vec<SubtitleCue>, SubtitleError> {
    if table.is_empty() {
        return Err(SubtitleError::NoClips);
    }

    let scale = table.time_scale();
    let mut stitched = Vec::new();
    let mut offset = 0.0;

    for entry in table.entries() {
        let duration = entry.duration_secs.max(0.0);
        let transcript = find_matching_transcript(transcript_dir, &entry.clip.path)?;
        let cues: Vec<SubtitleCue> = load_transcript(&transcript, duration * scale, max_chars)?
            .iter()
            .map(|cue| cue.scaled(scale))
            .collect();

        tracing::debug!(
            "{} -> {} cues at offset {:.3}s",
            transcript.display(),
            cues.len(),
            offset
        );

        let max_end = cues.iter().map(|c| c.end).fold(0.0_f64, f64::max);
        let span = duration.max(max_end);

        for cue in &cues {
            let mut global = cue.shifted(offset);
            if global.duration() < MIN_CUE_SECS {
                global.end = global.start + MIN_CUE_SECS;
            }
            stitched.push(global);
        }

        offset += if span > 0.0 { span } else { max_end };
    }

    Ok(stitched)
}
