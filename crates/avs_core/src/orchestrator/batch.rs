//! Batch runner: generates `count` outputs one after another.
//!
//! Each output gets its own logger, context and run state, and goes
//! through the standard pipeline. The batch stops at the first failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::logging::{LogCallback, RunLogger};
use crate::models::{duration_tag, GenerationParams};
use crate::subtitles::CueSource;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::types::{run_label, Context, ProgressCallback, RunState, Toolbox};
use super::{create_standard_pipeline, PipelineRunResult};

/// What one finished output consists of.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_index: usize,
    pub run_label: String,
    pub video_path: PathBuf,
    pub audio_duration_ms: u64,
    /// `MMmSSs` tag used in the file name.
    pub duration_tag: String,
    pub music_files: Vec<String>,
    pub video_files: Vec<String>,
    /// Where the burned-in subtitles came from, if any.
    pub subtitles: Option<CueSource>,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
    pub log_path: Option<PathBuf>,
}

impl RunReport {
    fn from_state(
        ctx: &Context,
        state: &RunState,
        run_result: PipelineRunResult,
    ) -> PipelineResult<Self> {
        let (Some(audio), Some(video), Some(path)) =
            (&state.audio, &state.video, state.final_output())
        else {
            return Err(PipelineError::step_failed(
                &ctx.run_label,
                "Report",
                StepError::invalid_output("pipeline finished without a final video"),
            ));
        };

        Ok(Self {
            run_index: ctx.run_index,
            run_label: ctx.run_label.clone(),
            video_path: path.to_path_buf(),
            audio_duration_ms: audio.duration_ms,
            duration_tag: duration_tag(audio.duration_ms),
            music_files: audio.used_files.clone(),
            video_files: video.timeline.used_files(),
            subtitles: state.subtitles.as_ref().map(|s| s.source),
            steps_completed: run_result.steps_completed,
            steps_skipped: run_result.steps_skipped,
            log_path: ctx.logger.log_path().map(Path::to_path_buf),
        })
    }
}

/// All outputs of a batch, in generation order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub finished_at: String,
    pub outputs: Vec<RunReport>,
}

/// Runs the standard pipeline once per requested output.
pub struct BatchRunner {
    settings: Settings,
    logs_dir: PathBuf,
    tools: Toolbox,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl BatchRunner {
    pub fn new(settings: Settings, logs_dir: impl Into<PathBuf>, tools: Toolbox) -> Self {
        Self {
            settings,
            logs_dir: logs_dir.into(),
            tools,
            log_callback: None,
            progress_callback: None,
        }
    }

    /// Receive every per-run log line.
    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Generate every output of `params`, stopping at the first failure.
    ///
    /// Parameters are validated before any tool runs.
    pub fn run(&self, params: &GenerationParams) -> PipelineResult<BatchReport> {
        let started_at = chrono::Local::now().to_rfc3339();

        params
            .validate()
            .map_err(|e| PipelineError::validation_failed("batch", e.to_string()))?;
        fs::create_dir_all(&params.output_dir).map_err(|e| {
            PipelineError::setup_failed(
                "batch",
                format!("cannot create {}: {}", params.output_dir.display(), e),
            )
        })?;

        tracing::info!(
            "Generating {} output(s) of {:.2} min into {}",
            params.count,
            params.target_minutes,
            params.output_dir.display()
        );

        let mut outputs = Vec::with_capacity(params.count);
        for run_index in 1..=params.count {
            match self.run_one(params, run_index) {
                Ok(report) => {
                    tracing::info!(
                        "[{}/{}] {}",
                        run_index,
                        params.count,
                        report.video_path.display()
                    );
                    outputs.push(report);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    return Err(e);
                }
            }
        }

        Ok(BatchReport {
            started_at,
            finished_at: chrono::Local::now().to_rfc3339(),
            outputs,
        })
    }

    /// Generate output `run_index` (1-based) of the batch.
    pub fn run_one(&self, params: &GenerationParams, run_index: usize) -> PipelineResult<RunReport> {
        let label = run_label(run_index, params.count);
        let logger = RunLogger::new(
            &label,
            &self.logs_dir,
            self.settings.logging.to_log_config(),
            self.log_callback.clone(),
        )
        .map_err(|e| PipelineError::setup_failed(&label, format!("cannot create log file: {}", e)))?;

        let mut ctx = Context::new(
            params.clone(),
            self.settings.clone(),
            run_index,
            params.count,
            Arc::new(logger),
            &self.tools,
        );
        if let Some(ref callback) = self.progress_callback {
            ctx = ctx.with_progress_callback(Arc::clone(callback));
        }

        ctx.logger
            .section(&format!("Output {} of {}", run_index, params.count));
        let mut state = RunState::new(uuid::Uuid::new_v4().to_string());
        let pipeline = create_standard_pipeline();

        let result = pipeline
            .run(&ctx, &mut state)
            .and_then(|run_result| RunReport::from_state(&ctx, &state, run_result));
        ctx.logger
            .debug(&format!("Probed {} distinct files", ctx.probe.probed_count()));

        match result {
            Ok(report) => {
                ctx.logger.info("Music used:");
                for file in &report.music_files {
                    ctx.logger.info(&format!("  {}", file));
                }
                ctx.logger.info("Video used:");
                for file in &report.video_files {
                    ctx.logger.info(&format!("  {}", file));
                }
                ctx.logger.close();
                Ok(report)
            }
            Err(e) => {
                ctx.logger.error(&e.to_string());
                ctx.logger.close();
                Err(e)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::SubtitleOptions;
    use crate::orchestrator::types::ProgressEvent;
    use crate::orchestrator::testing::{failing_ffmpeg, fake_ffmpeg, ffmpeg_calls, params, toolbox};
    use crate::subtitles::SubtitleCue;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn batch_writes_numbered_outputs_and_cleans_up() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let mut p = params(dir.path());
        p.count = 2;
        let tools = toolbox(&fake_ffmpeg(&bin), Vec::new());

        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let runner = BatchRunner::new(Settings::default(), dir.path().join("logs"), tools)
            .with_progress_callback(Arc::new(move |e: ProgressEvent| sink.lock().push(e)));

        let report = runner.run(&p).unwrap();
        assert_eq!(report.outputs.len(), 2);
        // a.mp3 + b.mp3 = 80s; the fake export cannot be probed
        assert_eq!(report.outputs[0].duration_tag, "01m20s");
        assert_eq!(report.outputs[0].music_files.len(), 2);
        assert!(report.outputs[0].subtitles.is_none());
        assert_eq!(report.outputs[1].run_label, "output_02");

        assert_eq!(
            file_names(&p.output_dir),
            vec!["final_video_01m20s_01.mp4", "final_video_01m20s_02.mp4"]
        );
        assert_eq!(file_names(&dir.path().join("logs")).len(), 2);

        // audio export, concat and mux per output
        assert_eq!(ffmpeg_calls(&bin).len(), 6);
        let events = events.lock();
        assert!(events.iter().any(|e| e.run_index == 2 && e.percent == 100));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("final_video_01m20s_02.mp4"));
    }

    #[test]
    fn subtitles_are_burned_in() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let mut p = params(dir.path());
        let transcript_dir = dir.path().join("transcripts");
        fs::create_dir_all(&transcript_dir).unwrap();
        p.subtitles = Some(SubtitleOptions {
            transcript_dir,
            font_name: "ZY Oliver".to_string(),
            font_size: 64,
            language: Some("en".to_string()),
            fonts_dir: None,
            max_line_chars: 40,
        });
        let tools = toolbox(&fake_ffmpeg(&bin), vec![SubtitleCue::new(1.0, 2.0, "la la")]);

        let report = BatchRunner::new(Settings::default(), dir.path().join("logs"), tools)
            .run(&p)
            .unwrap();

        let output = &report.outputs[0];
        assert_eq!(output.subtitles, Some(CueSource::Transcription));
        assert!(output.steps_skipped.is_empty());
        assert_eq!(file_names(&p.output_dir), vec!["final_video_01m20s.mp4"]);

        let calls = ffmpeg_calls(&bin);
        assert_eq!(calls.len(), 4);
        assert!(calls[3].contains("final_video_01m20s.ass"));
    }

    #[test]
    fn invalid_params_fail_before_tools_run() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let mut p = params(dir.path());
        p.speed_multiplier = 0.0;
        let tools = toolbox(&fake_ffmpeg(&bin), Vec::new());

        let err = BatchRunner::new(Settings::default(), dir.path().join("logs"), tools)
            .run(&p)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(ffmpeg_calls(&bin).is_empty());
    }

    #[test]
    fn empty_main_folder_fails_before_tools_run() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let p = params(dir.path());
        for name in ["v1.mp4", "v2.mp4"] {
            fs::remove_file(p.main_dir.join(name)).unwrap();
        }
        let tools = toolbox(&fake_ffmpeg(&bin), Vec::new());

        let err = BatchRunner::new(Settings::default(), dir.path().join("logs"), tools)
            .run(&p)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Main video folder has no usable clips"));
        assert!(ffmpeg_calls(&bin).is_empty());
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn tool_failure_stops_batch_and_leaves_no_intermediates() {
        let dir = tempdir().unwrap();
        let mut p = params(dir.path());
        p.count = 3;
        let tools = toolbox(&failing_ffmpeg(&dir.path().join("bin")), Vec::new());

        let err = BatchRunner::new(Settings::default(), dir.path().join("logs"), tools)
            .run(&p)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("output_01"));
        assert!(msg.contains("Invalid data found"));
        assert!(!err.is_validation());
        assert!(file_names(&p.output_dir).is_empty());
        // Only the first output was attempted
        assert_eq!(file_names(&dir.path().join("logs")).len(), 1);
    }
}
