//! Burn step - renders the subtitle track into the video.

use crate::media::commands::burn_args;
use crate::models::Stage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{BurnOutput, Context, RunState, StepOutcome};

pub struct BurnStep;

impl BurnStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BurnStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for BurnStep {
    fn name(&self) -> &str {
        "Burn"
    }

    fn stage(&self) -> Stage {
        Stage::Burn
    }

    fn description(&self) -> &str {
        "Burn in subtitles"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.subtitles.is_none() {
            return Ok(());
        }
        match state.mux {
            Some(ref mux) if !mux.is_final => Ok(()),
            Some(_) => Err(StepError::precondition_failed(
                "Mux wrote the final file although subtitles are pending",
            )),
            None => Err(StepError::precondition_failed("Mux step must run before burn-in")),
        }
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(ref subs) = state.subtitles else {
            return Ok(StepOutcome::Skipped("no subtitle track".to_string()));
        };
        let (Some(mux), Some(video)) = (&state.mux, &state.video) else {
            return Err(StepError::precondition_failed("Earlier results missing"));
        };
        let input = mux.path.clone();
        let subtitle_file = subs.path.clone();
        let output = video.final_path.clone();
        let expected_secs = video.timeline.total_adjusted_secs();

        let fonts_dir = ctx
            .params
            .subtitles
            .as_ref()
            .and_then(|o| o.fonts_dir.as_deref());
        let args = burn_args(&input, &subtitle_file, fonts_dir, &output);
        ctx.ffmpeg.run_with_progress(
            &args,
            expected_secs,
            &ctx.logger,
            &mut |percent| ctx.report_progress(Stage::Burn, percent, "Burning subtitles"),
        )?;

        state.release_temp(&input, &ctx.logger);
        state.release_temp(&subtitle_file, &ctx.logger);

        state.burn = Some(BurnOutput { path: output });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match state.burn {
            Some(ref burn) if burn.path.exists() => Ok(()),
            Some(ref burn) => Err(StepError::file_not_found(burn.path.display().to_string())),
            None => Err(StepError::invalid_output("Burn results not recorded")),
        }
    }
}
