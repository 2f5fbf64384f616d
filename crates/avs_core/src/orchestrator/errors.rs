//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::media::MediaError;
use crate::models::ParamError;
use crate::selection::SelectionError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("{run_label} failed at step '{step_name}': {source}")]
    StepFailed {
        run_label: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Parameters were rejected before any tool ran.
    #[error("{run_label} failed validation: {message}")]
    ValidationFailed { run_label: String, message: String },

    /// Failed to set up the run (output folder, log file).
    #[error("{run_label} setup failed: {message}")]
    SetupFailed { run_label: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        run_label: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_label: run_label.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn validation_failed(run_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            run_label: run_label.into(),
            message: message.into(),
        }
    }

    pub fn setup_failed(run_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_label: run_label.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened before any external tool ran.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::ValidationFailed { .. }
                | PipelineError::StepFailed {
                    source: StepError::Validation(_),
                    ..
                }
        )
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Inputs cannot produce an output (empty pool, zero duration, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The step ran but its result is unusable.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external command failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A step ran before the step it depends on.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

impl From<MediaError> for StepError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::CommandFailed {
                tool,
                exit_code,
                message,
            } => StepError::CommandFailed {
                tool,
                exit_code,
                message,
            },
            MediaError::Spawn { tool, source } => {
                StepError::io_error(format!("launching {}", tool), source)
            }
            MediaError::Io { operation, source } => StepError::io_error(operation, source),
        }
    }
}

impl From<SelectionError> for StepError {
    fn from(err: SelectionError) -> Self {
        StepError::Validation(err.to_string())
    }
}

impl From<ParamError> for StepError {
    fn from(err: ParamError) -> Self {
        StepError::Validation(err.to_string())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
