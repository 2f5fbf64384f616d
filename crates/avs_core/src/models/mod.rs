//! Data models for AV Stitcher.
//!
//! This module contains the value objects shared by the engine:
//! - Enums for media kinds and pipeline stages
//! - Clip references and directory scanning
//! - Timelines, playlist entries and the clip offset table
//! - Generation parameters and output naming

mod clip;
mod enums;
mod naming;
mod params;
mod timeline;

// Re-export all public types
pub use clip::{scan_clips, Clip};
pub use enums::{MediaKind, Stage};
pub use naming::{audio_file_name, duration_tag, video_file_name, AUDIO_EXPORT_NAME};
pub use params::{is_unit_speed, GenerationParams, ParamError, SubtitleOptions, SPEED_EPSILON};
pub use timeline::{ClipOffset, ClipOffsetTable, PlaylistEntry, Timeline};
