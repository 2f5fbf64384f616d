//! Duration probing with ffprobe.
//!
//! A probe never fails: any problem (missing tool, non-zero exit, garbage
//! output) yields `0.0`, which callers reject as an invalid clip.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{Clip, MediaKind};

/// Something that can report a clip's duration in seconds.
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, or `0.0` if it could not be determined.
    fn probe(&self, clip: &Clip) -> f64;
}

/// Probe durations by running `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProber {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one probe; video clips select the first video stream.
    pub fn build_args(path: &Path, kind: MediaKind) -> Vec<String> {
        let mut args = vec!["-v".to_string(), "error".to_string()];
        if kind == MediaKind::Video {
            args.push("-select_streams".to_string());
            args.push("v:0".to_string());
        }
        args.extend(
            [
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(path.to_string_lossy().to_string());
        args
    }
}

impl DurationProbe for FfprobeProber {
    fn probe(&self, clip: &Clip) -> f64 {
        tracing::debug!("Probing duration: {}", clip.path.display());

        let output = Command::new(&self.program)
            .args(Self::build_args(&clip.path, clip.kind))
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.program.display(), e);
                return 0.0;
            }
        };

        if !output.status.success() {
            tracing::warn!(
                "ffprobe exited with {:?} for {}",
                output.status.code(),
                clip.path.display()
            );
            return 0.0;
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the first line of ffprobe's bare `format=duration` output.
pub fn parse_duration(stdout: &str) -> f64 {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0)
}

/// Memoizing wrapper: each path is probed at most once per run.
pub struct ProbeCache {
    inner: Arc<dyn DurationProbe>,
    cache: Mutex<HashMap<PathBuf, f64>>,
}

impl ProbeCache {
    pub fn new(inner: Arc<dyn DurationProbe>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct paths probed so far.
    pub fn probed_count(&self) -> usize {
        self.cache.lock().len()
    }
}

impl DurationProbe for ProbeCache {
    fn probe(&self, clip: &Clip) -> f64 {
        if let Some(&secs) = self.cache.lock().get(&clip.path) {
            return secs;
        }
        let secs = self.inner.probe(clip);
        self.cache.lock().insert(clip.path.clone(), secs);
        secs
    }
}

/// Fixed durations keyed by file name, for tests.
#[cfg(test)]
pub(crate) struct FixedDurations {
    by_name: HashMap<String, f64>,
    pub(crate) calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FixedDurations {
    pub(crate) fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            by_name: pairs.iter().map(|(n, d)| (n.to_string(), *d)).collect(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl DurationProbe for FixedDurations {
    fn probe(&self, clip: &Clip) -> f64 {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.by_name.get(&clip.file_name()).copied().unwrap_or(0.0)
    }
}
