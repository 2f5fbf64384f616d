//! Core types for the orchestrator pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{Settings, ToolSettings};
use crate::logging::RunLogger;
use crate::media::{DurationProbe, FfmpegRunner, FfprobeProber, ProbeCache};
use crate::models::{
    audio_file_name, duration_tag, video_file_name, ClipOffsetTable, GenerationParams, Stage,
    Timeline,
};
use crate::subtitles::{CueSource, Transcriber, WhisperCli};

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 1-based index of the output being generated.
    pub run_index: usize,
    pub run_total: usize,
    pub stage: Stage,
    /// Percent of the current stage, 0-100.
    pub percent: u32,
    pub message: String,
}

/// Progress callback type for reporting pipeline progress.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// External collaborators shared by every run of a batch.
#[derive(Clone)]
pub struct Toolbox {
    pub prober: Arc<dyn DurationProbe>,
    pub ffmpeg: FfmpegRunner,
    pub transcriber: Arc<dyn Transcriber>,
}

impl Toolbox {
    /// Real tools at the configured executable paths.
    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self {
            prober: Arc::new(FfprobeProber::new(&tools.ffprobe)),
            ffmpeg: FfmpegRunner::new(&tools.ffmpeg),
            transcriber: Arc::new(WhisperCli::new(&tools.whisper, &tools.whisper_model)),
        }
    }
}

/// Label used for logs and errors, e.g. `output_03`.
pub fn run_label(run_index: usize, run_total: usize) -> String {
    let width = run_total.to_string().len().max(2);
    format!("output_{:0width$}", run_index, width = width)
}

/// Read-only context passed to pipeline steps.
///
/// Mutable results go in [`RunState`]. The RNG sits behind a mutex so
/// steps can draw from it through `&Context`.
pub struct Context {
    pub params: GenerationParams,
    pub settings: Settings,
    pub run_label: String,
    /// 1-based output index within the batch.
    pub run_index: usize,
    pub run_total: usize,
    pub logger: Arc<RunLogger>,
    /// Durations probed during this run.
    pub probe: ProbeCache,
    pub ffmpeg: FfmpegRunner,
    pub transcriber: Arc<dyn Transcriber>,
    rng: Mutex<StdRng>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a context for output `run_index` of `run_total`.
    ///
    /// With a seed in `params`, run `i` draws from `seed + i`, so a batch
    /// is reproducible but its outputs differ.
    pub fn new(
        params: GenerationParams,
        settings: Settings,
        run_index: usize,
        run_total: usize,
        logger: Arc<RunLogger>,
        tools: &Toolbox,
    ) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(run_index as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            params,
            settings,
            run_label: run_label(run_index, run_total),
            run_index,
            run_total,
            logger,
            probe: ProbeCache::new(Arc::clone(&tools.prober)),
            ffmpeg: tools.ffmpeg.clone(),
            transcriber: Arc::clone(&tools.transcriber),
            rng: Mutex::new(rng),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, stage: Stage, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(ProgressEvent {
                run_index: self.run_index,
                run_total: self.run_total,
                stage,
                percent: percent.min(100),
                message: message.to_string(),
            });
        }
    }

    /// Run `f` with this run's random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        f(&mut self.rng.lock())
    }

    pub fn output_dir(&self) -> &Path {
        &self.params.output_dir
    }

    pub fn audio_export_path(&self) -> PathBuf {
        self.output_dir()
            .join(audio_file_name(self.run_index, self.run_total))
    }

    /// Final video path, tagged with the audio duration.
    pub fn video_export_path(&self, audio_duration_ms: u64) -> PathBuf {
        let tag = duration_tag(audio_duration_ms);
        self.output_dir()
            .join(video_file_name(&tag, self.run_index, self.run_total))
    }

    /// Unique intermediate path in the output folder.
    pub fn temp_path(&self, prefix: &str, extension: &str) -> PathBuf {
        self.output_dir().join(format!(
            "__temp_{}_{}.{}",
            prefix,
            uuid::Uuid::new_v4().simple(),
            extension
        ))
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Write-once: each step fills its own section and later steps only read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitlesOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSelectionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat: Option<ConcatOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux: Option<MuxOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn: Option<BurnOutput>,
    /// Intermediate files still on disk.
    #[serde(skip)]
    temp_files: Vec<PathBuf>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Register an intermediate file for removal when the run ends.
    pub fn track_temp(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.temp_files.contains(&path) {
            self.temp_files.push(path);
        }
    }

    /// Delete a tracked intermediate now that it has been consumed.
    pub fn release_temp(&mut self, path: &Path, logger: &RunLogger) {
        self.temp_files.retain(|p| p != path);
        remove_quietly(path, logger);
    }

    pub fn temp_files(&self) -> &[PathBuf] {
        &self.temp_files
    }

    /// Delete every intermediate still tracked. Failures are logged only.
    pub fn cleanup(&mut self, logger: &RunLogger) {
        for path in std::mem::take(&mut self.temp_files) {
            remove_quietly(&path, logger);
        }
    }

    /// The finished video, once the last step has run.
    pub fn final_output(&self) -> Option<&Path> {
        if let Some(ref burn) = self.burn {
            return Some(&burn.path);
        }
        self.mux
            .as_ref()
            .filter(|m| m.is_final)
            .map(|m| m.path.as_path())
    }
}

fn remove_quietly(path: &Path, logger: &RunLogger) {
    match fs::remove_file(path) {
        Ok(()) => logger.debug(&format!("Removed {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => logger.debug(&format!("Could not remove {}: {}", path.display(), e)),
    }
}

/// Output from the Audio step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioOutput {
    /// The exported music track.
    pub export_path: PathBuf,
    /// Duration of the exported track.
    pub duration_ms: u64,
    /// Music files in playback order.
    pub used_files: Vec<String>,
    /// Clip offsets on the output timeline (tempo applied).
    pub offsets: ClipOffsetTable,
    pub tempo: f64,
    /// The single source file was copied instead of re-encoded.
    pub copied: bool,
}

impl AudioOutput {
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// Output from the Subtitles step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitlesOutput {
    /// The ASS file written next to the final video.
    pub path: PathBuf,
    pub cue_count: usize,
    pub source: CueSource,
}

/// Output from the Video selection step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSelectionOutput {
    pub timeline: Timeline,
    /// Where the finished video will be written.
    pub final_path: PathBuf,
}

/// Output from the Concatenate step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatOutput {
    pub path: PathBuf,
    /// The clips' own audio was kept in the concatenation.
    pub with_original_audio: bool,
}

/// Output from the Mux step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxOutput {
    pub path: PathBuf,
    /// False when the file is an intermediate awaiting burn-in.
    pub is_final: bool,
}

/// Output from the Burn step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnOutput {
    pub path: PathBuf,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Step did not apply to this run (not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use tempfile::tempdir;

    #[test]
    fn run_labels_are_padded() {
        assert_eq!(run_label(3, 5), "output_03");
        assert_eq!(run_label(7, 120), "output_007");
    }

    #[test]
    fn run_state_serializes_without_temp_files() {
        let mut state = RunState::new("run-1");
        state.track_temp("/tmp/__temp_concat.mp4");
        state.burn = Some(BurnOutput {
            path: PathBuf::from("/out/final_video_03m00s.mp4"),
        });

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"run_id\":\"run-1\""));
        assert!(json.contains("final_video_03m00s.mp4"));
        assert!(!json.contains("__temp_concat"));
        assert!(!json.contains("\"mux\""));
    }

    #[test]
    fn final_output_prefers_burn() {
        let mut state = RunState::new("run");
        assert!(state.final_output().is_none());

        state.mux = Some(MuxOutput {
            path: PathBuf::from("/out/merged.mp4"),
            is_final: false,
        });
        assert!(state.final_output().is_none());

        state.burn = Some(BurnOutput {
            path: PathBuf::from("/out/final.mp4"),
        });
        assert_eq!(state.final_output(), Some(Path::new("/out/final.mp4")));
    }

    #[test]
    fn cleanup_removes_tracked_files() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::detached("test", LogConfig::default(), None);
        let kept = dir.path().join("keep.mp4");
        let temp = dir.path().join("__temp_a.mp4");
        let released = dir.path().join("__temp_b.txt");
        for path in [&kept, &temp, &released] {
            fs::write(path, b"x").unwrap();
        }

        let mut state = RunState::new("run");
        state.track_temp(&temp);
        state.track_temp(&released);
        state.track_temp(dir.path().join("never_created.mp4"));

        state.release_temp(&released, &logger);
        assert!(!released.exists());
        assert_eq!(state.temp_files().len(), 2);

        state.cleanup(&logger);
        assert!(!temp.exists());
        assert!(kept.exists());
        assert!(state.temp_files().is_empty());
    }
}
