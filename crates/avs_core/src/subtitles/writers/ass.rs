//! ASS subtitle writer.
//!
//! Produces the burn-in artifact: a fixed 1920x1080 script with a single
//! `Default` style and one `Dialogue` line per cue.

use crate::subtitles::types::{SubtitleCue, SubtitleStyle};

pub const PLAY_RES_X: u32 = 1920;
pub const PLAY_RES_Y: u32 = 1080;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Render cues (global seconds) as an ASS script.
pub fn write_ass(cues: &[SubtitleCue], style: &SubtitleStyle) -> String {
    let mut lines = vec![
        "[Script Info]".to_string(),
        "ScriptType: v4.00+".to_string(),
        format!("PlayResX: {}", PLAY_RES_X),
        format!("PlayResY: {}", PLAY_RES_Y),
        "ScaledBorderAndShadow: yes".to_string(),
        "WrapStyle: 2".to_string(),
        String::new(),
        "[V4+ Styles]".to_string(),
        STYLE_FORMAT.to_string(),
        format_style_line(style),
        String::new(),
        "[Events]".to_string(),
        EVENT_FORMAT.to_string(),
    ];

    for cue in cues {
        lines.push(format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}",
            format_ass_time(cue.start),
            format_ass_time(cue.end),
            style.name,
            escape_ass_text(&cue.text)
        ));
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn format_style_line(style: &SubtitleStyle) -> String {
    // ASS uses -1 for true, 0 for false
    let flag = |b: bool| if b { -1 } else { 0 };

    format!(
        "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        style.name,
        style.fontname,
        style.fontsize,
        style.primary_color.to_ass_string(),
        style.secondary_color.to_ass_string(),
        style.outline_color.to_ass_string(),
        style.back_color.to_ass_string(),
        flag(style.bold),
        flag(style.italic),
        flag(style.underline),
        flag(style.strikeout),
        format_number(style.scale_x),
        format_number(style.scale_y),
        format_number(style.spacing),
        format_number(style.angle),
        style.border_style,
        format_number(style.outline),
        format_number(style.shadow),
        style.alignment,
        style.margin_l,
        style.margin_r,
        style.margin_v,
        style.encoding,
    )
}

/// Format a number, dropping a zero fraction (`4.0` -> `4`).
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Format seconds as an ASS timestamp `H:MM:SS.cc`.
///
/// Rounds to the nearest centisecond first, so a carry never produces
/// `60` in the seconds field.
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;

    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
}

/// Escape cue text for a `Dialogue` line.
pub fn escape_ass_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}
