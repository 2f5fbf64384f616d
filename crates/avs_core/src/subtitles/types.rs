//! Core subtitle data structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Shortest interval a cue may occupy, in seconds.
pub const MIN_CUE_SECS: f64 = 0.01;

/// One subtitle interval.
///
/// Times are in seconds. Depending on the stage they are clip-local or on
/// the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    /// Text, lines separated by `\n`.
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Copy with both ends moved by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self::new(self.start + offset, self.end + offset, self.text.clone())
    }

    /// Copy with both ends divided by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(self.start / scale, self.end / scale, self.text.clone())
    }
}

/// Transcript formats accepted per audio clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranscriptFormat {
    /// SubRip (.srt)
    Srt,
    /// Advanced SubStation Alpha (.ass)
    Ass,
    /// Plain text (.txt), spread evenly over the clip
    PlainText,
}

impl TranscriptFormat {
    /// Lookup order used when matching transcripts to clips.
    pub const ALL: [TranscriptFormat; 3] = [
        TranscriptFormat::Srt,
        TranscriptFormat::Ass,
        TranscriptFormat::PlainText,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::Ass => "ass",
            TranscriptFormat::PlainText => "txt",
        }
    }

    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// ASS style definition, covering the fields written in a style line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStyle {
    pub name: String,
    pub fontname: String,
    pub fontsize: u32,
    pub primary_color: AssColor,
    pub secondary_color: AssColor,
    pub outline_color: AssColor,
    pub back_color: AssColor,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    /// Horizontal scale (100 = normal).
    pub scale_x: f64,
    /// Vertical scale (100 = normal).
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    /// Border style (1 = outline + shadow, 3 = opaque box).
    pub border_style: i32,
    /// Outline width.
    pub outline: f64,
    /// Shadow depth.
    pub shadow: f64,
    /// Alignment (numpad style: 1-9).
    pub alignment: i32,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
}

impl SubtitleStyle {
    /// The burned-in caption style: bold yellow text with a black outline,
    /// bottom-centred and raised off the bottom edge.
    pub fn caption(fontname: impl Into<String>, fontsize: u32) -> Self {
        Self {
            name: "Default".to_string(),
            fontname: fontname.into(),
            fontsize,
            primary_color: AssColor::from_rgb(255, 255, 0),
            secondary_color: AssColor::from_rgb(255, 255, 0),
            outline_color: AssColor::from_rgb(0, 0, 0),
            back_color: AssColor::from_rgba(0, 0, 0, 0x80),
            bold: true,
            italic: false,
            underline: false,
            strikeout: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: 4.0,
            shadow: 2.0,
            alignment: 2,
            margin_l: 50,
            margin_r: 50,
            margin_v: 120,
            encoding: 1,
        }
    }
}

/// ASS color in ABGR format.
///
/// ASS uses &HAABBGGRR format (alpha, blue, green, red).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha (0 = opaque, 255 = transparent).
    pub a: u8,
}

impl AssColor {
    /// Create from RGB values (opaque).
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0 }
    }

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse from ASS color string (&HAABBGGRR or &HBBGGRR).
    pub fn from_ass_string(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('&').trim_start_matches('H');
        let value = u32::from_str_radix(s, 16).ok()?;
        let alpha = if s.len() <= 6 { 0 } else { ((value >> 24) & 0xFF) as u8 };

        Some(Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
            a: alpha,
        })
    }

    /// Convert to ASS color string (&HAABBGGRR).
    pub fn to_ass_string(&self) -> String {
        format!("&H{:02X}{:02X}{:02X}{:02X}", self.a, self.b, self.g, self.r)
    }
}
