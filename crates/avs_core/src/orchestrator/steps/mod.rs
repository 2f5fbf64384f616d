//! Pipeline step implementations.
//!
//! Each step handles one stage of producing an output video.

mod audio;
mod burn;
mod concat;
mod mux;
mod subtitles;
mod video;

pub use audio::AudioStep;
pub use burn::BurnStep;
pub use concat::ConcatStep;
pub use mux::MuxStep;
pub use subtitles::SubtitlesStep;
pub use video::VideoSelectionStep;
