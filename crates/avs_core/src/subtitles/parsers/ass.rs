//! ASS/SSA transcript parser.
//!
//! Only the `[Events]` section is read. `Dialogue:` lines are split according
//! to the section's `Format:` line (or the standard ten-field layout), the
//! text field keeps its commas, and `{...}` override blocks are stripped.
//!
//! All timing is in the format `H:MM:SS.cc` (centiseconds).

use crate::subtitles::types::SubtitleCue;

/// Parse ASS/SSA content into clip-local cues (seconds).
pub fn parse_ass(content: &str) -> Vec<SubtitleCue> {
    let mut in_events = false;
    let mut event_format: Vec<String> = Vec::new();
    let mut cues = Vec::new();

    for line in content.lines() {
        let line = line.trim_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            in_events = line.to_ascii_lowercase().starts_with("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(rest) = strip_prefix_ci(line, "format:") {
            event_format = parse_format_line(rest);
        } else if let Some(rest) = strip_prefix_ci(line, "dialogue:") {
            if event_format.is_empty() {
                event_format = default_event_format();
            }
            if let Some(cue) = parse_event_line(rest.trim_start(), &event_format) {
                cues.push(cue);
            }
        }
    }

    cues
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}

/// Field names of a `Format:` line, lowercased.
fn parse_format_line(rest: &str) -> Vec<String> {
    rest.split(',').map(|s| s.trim().to_lowercase()).collect()
}

fn parse_event_line(rest: &str, format: &[String]) -> Option<SubtitleCue> {
    let parts: Vec<&str> = rest.splitn(format.len(), ',').collect();
    if parts.len() < format.len() {
        return None;
    }

    let field = |name: &str| {
        format
            .iter()
            .position(|f| f == name)
            .and_then(|i| parts.get(i).copied())
    };

    let start = parse_ass_time(field("start").unwrap_or("0:00:00.00"))?;
    let end = parse_ass_time(field("end").unwrap_or("0:00:00.00"))?;

    let text = strip_override_tags(field("text").unwrap_or(""))
        .replace("\\N", "\n")
        .replace("\\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(SubtitleCue::new(start, end, text))
}

/// Remove `{...}` override blocks. An unclosed `{` is kept as text.
fn strip_override_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        match rest[open..].find('}') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Parse an ASS timestamp `H:MM:SS.cc` into seconds (never negative).
pub fn parse_ass_time(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u32 = parts[0].trim().parse().ok()?;
    let minutes: u32 = parts[1].trim().parse().ok()?;
    let seconds: f64 = parts[2].trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }

    Some((hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds).max(0.0))
}

/// Default event format for the Events section.
fn default_event_format() -> Vec<String> {
    vec![
        "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
