//! Timelines of selected clips and the per-clip offset table.

use serde::{Deserialize, Serialize};

use super::clip::Clip;

/// One selected clip on a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// The source clip.
    pub clip: Clip,
    /// Use only the first N source seconds (`None` = whole clip).
    pub trim_secs: Option<f64>,
    /// Probed duration of the whole clip in source seconds.
    pub probed_secs: f64,
    /// Duration this entry occupies in the output, after speed scaling.
    pub output_secs: f64,
    /// Whether the entry was drawn from the opening pool.
    #[serde(default)]
    pub from_opening: bool,
}

impl PlaylistEntry {
    /// An entry that uses the whole clip.
    pub fn whole(clip: Clip, probed_secs: f64, speed: f64) -> Self {
        Self {
            clip,
            trim_secs: None,
            probed_secs,
            output_secs: probed_secs / speed,
            from_opening: false,
        }
    }

    /// An entry that uses only the first `needed_secs` source seconds.
    ///
    /// `needed_secs` is clamped to the probed duration.
    pub fn trimmed(clip: Clip, probed_secs: f64, needed_secs: f64, speed: f64) -> Self {
        let needed = needed_secs.min(probed_secs);
        Self {
            clip,
            trim_secs: Some(needed),
            probed_secs,
            output_secs: needed / speed,
            from_opening: false,
        }
    }

    /// Mark the entry as coming from the opening pool.
    pub fn with_opening(mut self, from_opening: bool) -> Self {
        self.from_opening = from_opening;
        self
    }

    /// Source seconds actually consumed from the clip.
    pub fn source_secs(&self) -> f64 {
        self.trim_secs.unwrap_or(self.probed_secs)
    }

    pub fn is_trimmed(&self) -> bool {
        self.trim_secs.is_some()
    }

    /// Human-readable description for the run summary.
    pub fn describe(&self) -> String {
        match self.trim_secs {
            Some(trim) => format!(
                "{} (first {:.2}s -> output {:.2}s)",
                self.clip, trim, self.output_secs
            ),
            None => self.clip.to_string(),
        }
    }
}

/// Ordered sequence of selected entries forming one output track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    entries: Vec<PlaylistEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: PlaylistEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of output-time durations of all entries.
    pub fn total_adjusted_secs(&self) -> f64 {
        self.entries.iter().map(|e| e.output_secs).sum()
    }

    /// Descriptions of the used clips in order.
    pub fn used_files(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.describe()).collect()
    }
}

/// One row of a [`ClipOffsetTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipOffset {
    pub clip: Clip,
    /// Duration of the clip on the table's timeline.
    pub duration_secs: f64,
}

/// Ordered per-clip durations used to map clip-local time to timeline time.
///
/// Offsets are cumulative sums of durations in append order. `time_scale`
/// is the divisor that converts a clip-local source time into a time on this
/// table's timeline (1.0 for source time, the tempo for the scaled table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipOffsetTable {
    entries: Vec<ClipOffset>,
    time_scale: f64,
}

impl Default for ClipOffsetTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipOffsetTable {
    /// An empty table in source time.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            time_scale: 1.0,
        }
    }

    pub fn push(&mut self, clip: Clip, duration_secs: f64) {
        self.entries.push(ClipOffset {
            clip,
            duration_secs,
        });
    }

    /// A copy with every duration divided by `tempo`.
    pub fn scaled(&self, tempo: f64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| ClipOffset {
                    clip: e.clip.clone(),
                    duration_secs: e.duration_secs / tempo,
                })
                .collect(),
            time_scale: self.time_scale * tempo,
        }
    }

    /// Replace the table with a single clip of the given duration.
    pub fn single(clip: Clip, duration_secs: f64) -> Self {
        let mut table = Self::new();
        table.push(clip, duration_secs);
        table
    }

    pub fn entries(&self) -> &[ClipOffset] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Convert a clip-local source time to a time on this table's timeline.
    pub fn local_to_timeline(&self, local_secs: f64) -> f64 {
        local_secs / self.time_scale
    }

    /// Starting offset of each clip.
    pub fn offsets(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.entries
            .iter()
            .map(|e| {
                let start = acc;
                acc += e.duration_secs;
                start
            })
            .collect()
    }

    pub fn total_secs(&self) -> f64 {
        self.entries.iter().map(|e| e.duration_secs).sum()
    }
}
