//! Pipeline orchestrator for generating output videos.
//!
//! Each output is produced by a linear pipeline of steps that validate,
//! execute, and record their results in a shared [`RunState`]. A
//! [`BatchRunner`] drives the pipeline once per requested output.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Audio            (music playlist + export)
//!     ├── Step: Subtitles        (optional, re-timed transcripts)
//!     ├── Step: VideoSelection   (clips filling the music length)
//!     ├── Step: Concatenate
//!     ├── Step: Mux              (music under the video)
//!     └── Step: Burn             (only with a subtitle track)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use avs_core::orchestrator::{BatchRunner, Toolbox};
//!
//! let tools = Toolbox::from_settings(&settings.tools);
//! let runner = BatchRunner::new(settings, logs_dir, tools);
//! let report = runner.run(&params)?;
//! for output in &report.outputs {
//!     println!("{}", output.video_path.display());
//! }
//! ```

mod batch;
mod errors;
mod pipeline;
mod step;
pub mod steps;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use batch::{BatchReport, BatchRunner, RunReport};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{AudioStep, BurnStep, ConcatStep, MuxStep, SubtitlesStep, VideoSelectionStep};
pub use types::{
    run_label, AudioOutput, BurnOutput, ConcatOutput, Context, MuxOutput, ProgressCallback,
    ProgressEvent, RunState, StepOutcome, SubtitlesOutput, Toolbox, VideoSelectionOutput,
};

/// Create the pipeline every output goes through.
///
/// Order matters: subtitles need the music offsets, and the mux step
/// writes an intermediate only when a subtitle track is waiting.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(AudioStep::new())
        .with_step(SubtitlesStep::new())
        .with_step(VideoSelectionStep::new())
        .with_step(ConcatStep::new())
        .with_step(MuxStep::new())
        .with_step(BurnStep::new())
}
