//! Video selection step - fills the music length with video clips.

use crate::models::{scan_clips, Clip, MediaKind, Stage};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome, VideoSelectionOutput};
use crate::selection::{select_video_timeline, VideoRequest, FIT_EPSILON_SECS};

pub struct VideoSelectionStep;

impl VideoSelectionStep {
    pub fn new() -> Self {
        Self
    }

    fn opening_pool(ctx: &Context) -> StepResult<Vec<Clip>> {
        let params = &ctx.params;
        let Some(ref dir) = params.opening_dir else {
            return Ok(Vec::new());
        };
        if params.opening_count == 0 {
            return Ok(Vec::new());
        }

        let pool = scan_clips(dir, MediaKind::Video)
            .map_err(|e| StepError::io_error("scanning opening folder", e))?;
        if pool.is_empty() {
            ctx.logger.warn(&format!(
                "Opening folder {} has no video clips; using the main pool only",
                dir.display()
            ));
        }
        Ok(pool)
    }
}

impl Default for VideoSelectionStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for VideoSelectionStep {
    fn name(&self) -> &str {
        "VideoSelection"
    }

    fn stage(&self) -> Stage {
        Stage::VideoSelection
    }

    fn description(&self) -> &str {
        "Select video clips"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match state.audio {
            Some(_) => Ok(()),
            None => Err(StepError::precondition_failed(
                "Audio step must run before video selection",
            )),
        }
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let audio = state
            .audio
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Audio results missing"))?;
        let params = &ctx.params;

        let pool = scan_clips(&params.main_dir, MediaKind::Video)
            .map_err(|e| StepError::io_error("scanning main video folder", e))?;
        let opening = Self::opening_pool(ctx)?;
        let first = params.first_video.as_ref().map(Clip::video);

        let request = VideoRequest {
            pool: &pool,
            first: first.as_ref(),
            opening_pool: &opening,
            opening_count: params.opening_count,
            target_secs: audio.duration_secs(),
            speed: params.speed_multiplier,
        };
        let timeline = ctx.with_rng(|rng| select_video_timeline(&request, &ctx.probe, rng))?;

        ctx.logger.info(&format!(
            "Selected {} video clip(s) for {:.2}s",
            timeline.len(),
            timeline.total_adjusted_secs()
        ));
        for line in timeline.used_files() {
            ctx.logger.debug(&format!("  {}", line));
        }

        state.video = Some(VideoSelectionOutput {
            timeline,
            final_path: ctx.video_export_path(audio.duration_ms),
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let (Some(audio), Some(video)) = (&state.audio, &state.video) else {
            return Err(StepError::invalid_output("Video selection not recorded"));
        };
        if video.timeline.is_empty() {
            return Err(StepError::invalid_output("No video clips selected"));
        }

        let gap = (video.timeline.total_adjusted_secs() - audio.duration_secs()).abs();
        if gap > FIT_EPSILON_SECS {
            return Err(StepError::invalid_output(format!(
                "Video length misses the music length by {:.3}s",
                gap
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClipOffsetTable;
    use crate::orchestrator::testing::{context_with, params, test_context, toolbox};
    use crate::orchestrator::types::AudioOutput;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn with_audio(duration_ms: u64) -> RunState {
        let mut state = RunState::new("run");
        state.audio = Some(AudioOutput {
            export_path: PathBuf::from("bgm_final.mp3"),
            duration_ms,
            used_files: Vec::new(),
            offsets: ClipOffsetTable::new(),
            tempo: 1.0,
            copied: true,
        });
        state
    }

    #[test]
    fn requires_audio_first() {
        let dir = tempdir().unwrap();
        let (ctx, _) = test_context(dir.path());
        let err = VideoSelectionStep::new()
            .validate_input(&ctx, &RunState::new("run"))
            .unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }

    #[test]
    fn fills_music_length() {
        let dir = tempdir().unwrap();
        let (ctx, _) = test_context(dir.path());
        let mut state = with_audio(80_000);

        let step = VideoSelectionStep::new();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let video = state.video.as_ref().unwrap();
        // 25 + 25 + 25 + 5 trimmed
        assert_eq!(video.timeline.len(), 4);
        assert!((video.timeline.total_adjusted_secs() - 80.0).abs() < 1e-3);
        assert_eq!(
            video.final_path,
            ctx.params.output_dir.join("final_video_01m20s.mp4")
        );
        let last = video.timeline.entries().last().unwrap();
        assert!((last.trim_secs.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn pinned_clip_leads() {
        let dir = tempdir().unwrap();
        let mut p = params(dir.path());
        p.first_video = Some(p.main_dir.join("v2.mp4"));
        let tools = toolbox(Path::new("ffmpeg"), Vec::new());
        let (ctx, _) = context_with(p, &tools);
        let mut state = with_audio(10_000);

        VideoSelectionStep::new().execute(&ctx, &mut state).unwrap();
        let video = state.video.as_ref().unwrap();
        assert_eq!(video.timeline.len(), 1);
        assert_eq!(video.timeline.entries()[0].clip.file_name(), "v2.mp4");
        assert_eq!(video.timeline.entries()[0].trim_secs, Some(10.0));
    }

    #[test]
    fn empty_opening_folder_falls_back_to_main() {
        let dir = tempdir().unwrap();
        let mut p = params(dir.path());
        let opening = dir.path().join("opening");
        fs::create_dir_all(&opening).unwrap();
        p.opening_dir = Some(opening);
        p.opening_count = 3;
        let tools = toolbox(Path::new("ffmpeg"), Vec::new());
        let (ctx, _) = context_with(p, &tools);
        let mut state = with_audio(30_000);

        VideoSelectionStep::new().execute(&ctx, &mut state).unwrap();
        let video = state.video.as_ref().unwrap();
        assert!(video.timeline.entries().iter().all(|e| !e.from_opening));
    }

    #[test]
    fn empty_main_folder_is_validation_error() {
        let dir = tempdir().unwrap();
        let (ctx, _) = test_context(dir.path());
        for entry in fs::read_dir(&ctx.params.main_dir).unwrap() {
            fs::remove_file(entry.unwrap().path()).unwrap();
        }

        let err = VideoSelectionStep::new()
            .execute(&ctx, &mut with_audio(30_000))
            .unwrap_err();
        assert!(matches!(err, StepError::Validation(_)));
    }
}
