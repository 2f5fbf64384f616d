//! AVS Core - engine behind AV Stitcher
//!
//! Builds background-music playlists, fills their length with video clips,
//! re-times transcripts into a subtitle track, and drives ffmpeg to produce
//! the final videos. No UI dependencies; the CLI is a thin layer on top.

pub mod config;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod selection;
pub mod subtitles;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
