//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};
use crate::models::Stage;

/// Steps of one output run, executed in order.
///
/// Intermediates registered in [`RunState`] are removed when `run`
/// returns, whether it succeeded or not.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step against `state`.
    ///
    /// For each step: `validate_input`, `execute`, then `validate_output`
    /// if it returned `Success`. The first error stops the run.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let outcome = self.run_steps(ctx, state);

        if !state.temp_files().is_empty() {
            ctx.logger.debug(&format!(
                "Removing {} intermediate file(s)",
                state.temp_files().len()
            ));
        }
        state.cleanup(&ctx.logger);

        let result = outcome?;
        ctx.report_progress(Stage::Complete, 100, "Output finished");
        match state.final_output() {
            Some(path) => ctx
                .logger
                .success(&format!("Output written to {}", path.display())),
            None => ctx.logger.success("Pipeline completed successfully"),
        }
        Ok(result)
    }

    fn run_steps(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            ctx.logger.phase(step.description());
            ctx.report_progress(step.stage(), 0, &format!("Starting {}", step_name));

            ctx.logger
                .debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.run_label, step_name, e));
            }

            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("{} failed: {}", step_name, e));
                PipelineError::step_failed(&ctx.run_label, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.run_label, step_name, e));
                    }
                    ctx.logger.success(&format!("{} completed", step_name));
                    ctx.report_progress(step.stage(), 100, &format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) if !step.is_optional() => {
                    ctx.logger
                        .error(&format!("Required step {} skipped: {}", step_name, reason));
                    return Err(PipelineError::step_failed(
                        &ctx.run_label,
                        step_name,
                        StepError::precondition_failed(format!("required step skipped: {}", reason)),
                    ));
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}
