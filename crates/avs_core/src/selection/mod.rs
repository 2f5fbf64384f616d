//! Clip selection for the music track and the video track.
//!
//! Selection is pure: it only needs durations (through a
//! [`DurationProbe`](crate::media::DurationProbe)) and a random source, so it
//! runs deterministically under a seeded RNG.

mod audio;
mod history;
mod pool;
mod video;

use std::path::PathBuf;

use thiserror::Error;

pub use audio::{effective_target_secs, plan_audio_playlist, AudioPlaylist, AudioRequest};
pub use history::{RecentHistory, HISTORY_CAPACITY};
pub use pool::{DrawOrder, ShufflePool};
pub use video::{select_video_timeline, VideoRequest, FIT_EPSILON_SECS};

/// Selection inputs that cannot produce a timeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("The {pool} pool is empty")]
    EmptyPool { pool: &'static str },

    #[error("Could not determine the duration of {}", .path.display())]
    ZeroDuration { path: PathBuf },

    #[error("{name} must be greater than 0 (got {value})")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("Target duration must be greater than 0")]
    InvalidTarget,
}
