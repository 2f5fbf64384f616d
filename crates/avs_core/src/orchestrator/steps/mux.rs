//! Mux step - puts the background music under the concatenated video.

use crate::media::commands::mux_args;
use crate::models::Stage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MuxOutput, RunState, StepOutcome};

/// Writes the final video, or an intermediate when subtitles still need
/// burning in.
pub struct MuxStep;

impl MuxStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MuxStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MuxStep {
    fn name(&self) -> &str {
        "Mux"
    }

    fn stage(&self) -> Stage {
        Stage::Mux
    }

    fn description(&self) -> &str {
        "Merge music and video"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.audio.is_none() {
            return Err(StepError::precondition_failed("No exported music"));
        }
        if state.video.is_none() {
            return Err(StepError::precondition_failed("No video selection"));
        }
        match state.concat {
            Some(ref concat) if concat.path.exists() => Ok(()),
            Some(ref concat) => Err(StepError::file_not_found(concat.path.display().to_string())),
            None => Err(StepError::precondition_failed("No concatenated video")),
        }
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let (Some(audio), Some(video), Some(concat)) = (&state.audio, &state.video, &state.concat)
        else {
            return Err(StepError::precondition_failed("Earlier results missing"));
        };
        let music = audio.export_path.clone();
        let concat_path = concat.path.clone();
        let keep_audio = concat.with_original_audio;

        let is_final = state.subtitles.is_none();
        let output = if is_final {
            video.final_path.clone()
        } else {
            ctx.temp_path("merged", "mp4")
        };
        if !is_final {
            state.track_temp(&output);
        }

        let args = mux_args(&concat_path, &music, &output, keep_audio);
        ctx.ffmpeg.run(&args, &ctx.logger)?;

        state.release_temp(&concat_path, &ctx.logger);
        state.release_temp(&music, &ctx.logger);

        state.mux = Some(MuxOutput {
            path: output,
            is_final,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match state.mux {
            Some(ref mux) if mux.path.exists() => Ok(()),
            Some(ref mux) => Err(StepError::file_not_found(mux.path.display().to_string())),
            None => Err(StepError::invalid_output("Mux results not recorded")),
        }
    }
}
