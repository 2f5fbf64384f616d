//! Line wrapping and interval clean-up for cues.

use super::types::SubtitleCue;

/// Default maximum characters per subtitle line.
pub const DEFAULT_MAX_LINE_CHARS: usize = 40;

/// Minimum length of a refined or plain-text cue, in seconds.
pub const MIN_SEGMENT_SECS: f64 = 0.05;

/// Wrap one line to at most `max_chars` characters per line.
///
/// Text with ASCII letters and spaces is wrapped on word boundaries without
/// breaking long words; anything else (e.g. CJK) is sliced every
/// `max_chars` characters.
pub fn wrap_line(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let looks_latin = text.chars().any(|c| c.is_ascii_alphabetic());
    if looks_latin && text.contains(' ') {
        return wrap_words(text, max_chars);
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap every line of a possibly multi-line text.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    text.replace('\r', "\n")
        .split('\n')
        .flat_map(|line| wrap_line(line, max_chars))
        .collect()
}

/// Re-wrap cue texts, dropping cues that end up empty.
pub fn reflow_cues(cues: Vec<SubtitleCue>, max_chars: usize) -> Vec<SubtitleCue> {
    if max_chars == 0 {
        return cues;
    }

    cues.into_iter()
        .filter_map(|cue| {
            let mut combined = wrap_text(&cue.text, max_chars).join("\n");
            if combined.is_empty() {
                combined = cue.text.trim().to_string();
            }
            if combined.is_empty() {
                return None;
            }
            Some(SubtitleCue::new(cue.start, cue.end, combined))
        })
        .collect()
}

/// Normalize machine-transcribed segments: non-negative starts, at least
/// [`MIN_SEGMENT_SECS`] long, wrapped text.
pub fn refine_segments(cues: Vec<SubtitleCue>, max_chars: usize) -> Vec<SubtitleCue> {
    cues.into_iter()
        .filter_map(|cue| {
            let start = cue.start.max(0.0);
            let end = cue.end.max(start + MIN_SEGMENT_SECS);
            let lines = wrap_text(&cue.text, max_chars);
            if lines.is_empty() {
                None
            } else {
                Some(SubtitleCue::new(start, end, lines.join("\n")))
            }
        })
        .collect()
}

/// Clamp cues into `[0, duration]`, keep them non-degenerate and sort by
/// start.
pub fn clamp_cues(cues: Vec<SubtitleCue>, duration: f64) -> Vec<SubtitleCue> {
    let total = if duration <= 0.0 { 0.01 } else { duration };

    let mut clamped: Vec<SubtitleCue> = cues
        .into_iter()
        .filter_map(|cue| {
            let text = cue.text.trim();
            if text.is_empty() {
                return None;
            }
            let start = cue.start.clamp(0.0, total);
            let end = (start + 0.01).max(cue.end.min(total));
            Some(SubtitleCue::new(start, end, text))
        })
        .collect();

    clamped.sort_by(|a, b| a.start.total_cmp(&b.start));
    clamped
}
