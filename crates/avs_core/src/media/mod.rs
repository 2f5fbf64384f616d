//! External media tools: duration probing and ffmpeg invocations.

pub mod commands;
mod error;
pub mod ffmpeg;
pub mod filters;
pub mod probe;

pub use error::{MediaError, MediaResult};
pub use ffmpeg::{FfmpegRunner, ProgressTracker};
pub use probe::{DurationProbe, FfprobeProber, ProbeCache};

#[cfg(test)]
pub(crate) use probe::FixedDurations;
