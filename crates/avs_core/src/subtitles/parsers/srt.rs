//! SRT transcript parser.
//!
//! # Format Overview
//!
//! SRT files consist of sequential entries:
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! The index line is optional. Blocks without a valid timing line or
//! without text are skipped rather than rejected.

use crate::subtitles::types::SubtitleCue;

/// Parse SRT content into clip-local cues (seconds).
pub fn parse_srt(content: &str) -> Vec<SubtitleCue> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.split('\n').chain(std::iter::once("")) {
        let line = line.trim_matches('\u{feff}').trim();
        if line.is_empty() {
            if let Some(cue) = parse_block(&block) {
                cues.push(cue);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }

    cues
}

fn parse_block(lines: &[&str]) -> Option<SubtitleCue> {
    let mut lines = lines;
    if lines.first()?.chars().all(|c| c.is_ascii_digit()) {
        lines = &lines[1..];
    }

    let (start, end) = parse_srt_timing(lines.first()?)?;
    let text = lines[1..].join("\n").trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some(SubtitleCue::new(start, end, text))
}

/// Parse a timing line: `HH:MM:SS,mmm --> HH:MM:SS,mmm`.
///
/// Anything after the end timestamp (position hints) is ignored.
fn parse_srt_timing(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_srt_time(left.trim())?;
    let end = parse_srt_time(right.split_whitespace().next()?)?;
    Some((start, end))
}

/// Parse an SRT timestamp `H:MM:SS,mmm` (`.` also accepted, 1-3 fraction
/// digits) into seconds.
pub fn parse_srt_time(s: &str) -> Option<f64> {
    let mut parts = s.trim().split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let (whole, fraction) = seconds.split_once([',', '.'])?;

    let digits_ok = |v: &str, min: usize, max: usize| {
        (min..=max).contains(&v.len()) && v.chars().all(|c| c.is_ascii_digit())
    };
    if !digits_ok(hours, 1, 2)
        || !digits_ok(minutes, 2, 2)
        || !digits_ok(whole, 2, 2)
        || !digits_ok(fraction, 1, 3)
    {
        return None;
    }

    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let secs: f64 = format!("{}.{}", whole, fraction).parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + secs)
}
