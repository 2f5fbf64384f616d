//! Subtitles step - re-times transcripts onto the music track.
//!
//! Failures here never fail the run: the output is produced without
//! subtitles and a warning is logged.

use crate::models::Stage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome, SubtitlesOutput};
use crate::subtitles::{build_subtitle_track, write_ass_file, SubtitleStyle};

/// Writes `<final video stem>.ass` for the burn step.
pub struct SubtitlesStep;

impl SubtitlesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SubtitlesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SubtitlesStep {
    fn name(&self) -> &str {
        "Subtitles"
    }

    fn stage(&self) -> Stage {
        Stage::Subtitles
    }

    fn description(&self) -> &str {
        "Build subtitle track"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if ctx.params.subtitles.is_some() && state.audio.is_none() {
            return Err(StepError::precondition_failed(
                "Audio step must run before subtitles",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(ref options) = ctx.params.subtitles else {
            return Ok(StepOutcome::Skipped("subtitles not enabled".to_string()));
        };
        let audio = state
            .audio
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Audio results missing"))?;

        let (cues, source) = build_subtitle_track(
            &options.transcript_dir,
            &audio.offsets,
            &audio.export_path,
            options.language.as_deref(),
            ctx.transcriber.as_ref(),
            options.max_line_chars,
        );
        let Some(source) = source else {
            ctx.logger
                .warn("No subtitle cues were produced; continuing without subtitles");
            return Ok(StepOutcome::Skipped("no subtitle cues".to_string()));
        };

        let path = ctx
            .video_export_path(audio.duration_ms)
            .with_extension("ass");
        let style = SubtitleStyle::caption(&options.font_name, options.font_size);
        if let Err(e) = write_ass_file(&path, &cues, &style) {
            ctx.logger
                .warn(&format!("{}; continuing without subtitles", e));
            return Ok(StepOutcome::Skipped("subtitle file not written".to_string()));
        }
        state.track_temp(&path);

        ctx.logger.info(&format!(
            "Wrote {} cue(s) from {:?} to {}",
            cues.len(),
            source,
            path.display()
        ));
        state.subtitles = Some(SubtitlesOutput {
            path,
            cue_count: cues.len(),
            source,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match state.subtitles {
            Some(ref subs) if subs.path.exists() => Ok(()),
            Some(ref subs) => Err(StepError::file_not_found(subs.path.display().to_string())),
            None => Err(StepError::invalid_output("Subtitle results not recorded")),
        }
    }
}
