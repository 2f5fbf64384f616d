//! Concatenate step - joins the selected clips into one video.

use std::fs;

use crate::media::commands::{concat_list_contents, concat_with_audio_args, concat_video_only_args};
use crate::models::Stage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ConcatOutput, Context, RunState, StepOutcome};

/// Encodes the timeline into an intermediate MP4.
///
/// With original audio kept, clips go through the concat demuxer so their
/// audio streams survive; otherwise only the video streams are joined.
pub struct ConcatStep;

impl ConcatStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConcatStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ConcatStep {
    fn name(&self) -> &str {
        "Concatenate"
    }

    fn stage(&self) -> Stage {
        Stage::Concat
    }

    fn description(&self) -> &str {
        "Concatenate video clips"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let video = state.video.as_ref().ok_or_else(|| {
            StepError::precondition_failed("Video selection must run before concatenation")
        })?;
        for entry in video.timeline.entries() {
            if !entry.clip.path.exists() {
                return Err(StepError::file_not_found(entry.clip.path.display().to_string()));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let timeline = state
            .video
            .as_ref()
            .map(|v| v.timeline.clone())
            .ok_or_else(|| StepError::precondition_failed("Video selection missing"))?;
        let speed = ctx.params.speed_multiplier;
        let keep_audio = ctx.params.keep_original_audio;

        let output = ctx.temp_path("concat", "mp4");
        state.track_temp(&output);

        let mut list_file = None;
        let args = if keep_audio {
            let path = ctx.temp_path("concat_list", "txt");
            fs::write(&path, concat_list_contents(timeline.entries()))
                .map_err(|e| StepError::io_error("writing concat list", e))?;
            state.track_temp(&path);
            let args = concat_with_audio_args(&path, speed, &output);
            list_file = Some(path);
            args
        } else {
            concat_video_only_args(timeline.entries(), speed, &output)
        };

        ctx.ffmpeg.run_with_progress(
            &args,
            timeline.total_adjusted_secs(),
            &ctx.logger,
            &mut |percent| ctx.report_progress(Stage::Concat, percent, "Concatenating"),
        )?;

        if let Some(path) = list_file {
            state.release_temp(&path, &ctx.logger);
        }

        state.concat = Some(ConcatOutput {
            path: output,
            with_original_audio: keep_audio,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match state.concat {
            Some(ref concat) if concat.path.exists() => Ok(()),
            Some(ref concat) => Err(StepError::file_not_found(concat.path.display().to_string())),
            None => Err(StepError::invalid_output("Concatenation not recorded")),
        }
    }
}
