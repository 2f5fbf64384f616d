//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};
use crate::models::Stage;

/// One stage of an output run.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - check that earlier steps left what this one needs
/// 2. `execute` - do the work and record results in `RunState`
/// 3. `validate_output` - verify the recorded result (only after `Success`)
///
/// Intermediate files a step creates are registered with
/// [`RunState::track_temp`] so they are removed however the run ends.
pub trait PipelineStep: Send + Sync {
    /// Step name for logging and error context.
    fn name(&self) -> &str;

    /// Stage reported in progress events.
    fn stage(&self) -> Stage;

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Returns `StepOutcome::Skipped` when the step does not apply to this
    /// run. Only optional steps may skip; the pipeline fails a run whose
    /// required step skips.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Optional steps may be skipped by configuration or missing input.
    fn is_optional(&self) -> bool {
        false
    }

    fn description(&self) -> &str {
        self.name()
    }
}
