//! Plain-text transcripts.
//!
//! A `.txt` transcript carries no timing. It is cut into short phrases that
//! are spread evenly over the clip.

use crate::subtitles::reflow::{clamp_cues, wrap_line, MIN_SEGMENT_SECS};
use crate::subtitles::types::SubtitleCue;

/// Characters that end a sentence.
const SENTENCE_ENDS: [char; 6] = ['。', '！', '？', '!', '?', '…'];

/// Split text into display phrases: one per line break and per sentence,
/// each wrapped to `max_chars`.
pub fn split_into_phrases(text: &str, max_chars: usize) -> Vec<String> {
    text.replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .flat_map(split_sentences)
        .flat_map(|sentence| wrap_line(&sentence, max_chars))
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

fn split_sentences(chunk: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut after_end = false;

    for c in chunk.chars() {
        if after_end && !SENTENCE_ENDS.contains(&c) {
            if c.is_whitespace() {
                continue;
            }
            sentences.push(std::mem::take(&mut current));
            after_end = false;
        }
        current.push(c);
        if SENTENCE_ENDS.contains(&c) {
            after_end = true;
        }
    }
    sentences.push(current);

    sentences
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Spread the phrases of `content` evenly over `duration` seconds.
pub fn parse_plain(content: &str, duration: f64, max_chars: usize) -> Vec<SubtitleCue> {
    let phrases = split_into_phrases(content, max_chars);
    if phrases.is_empty() {
        return Vec::new();
    }

    let total = duration.max(0.01);
    let per_phrase = total / phrases.len() as f64;
    let mut start = 0.0;
    let mut cues = Vec::with_capacity(phrases.len());

    for phrase in phrases {
        let mut end = total.min(start + per_phrase);
        if end - start < MIN_SEGMENT_SECS {
            end = total.min(start + MIN_SEGMENT_SECS);
        }
        cues.push(SubtitleCue::new(start, end, phrase));
        start = end;
    }

    if let Some(last) = cues.last_mut() {
        last.end = total;
    }

    clamp_cues(cues, duration)
}
