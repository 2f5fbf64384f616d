//! Command-line arguments.

use std::path::PathBuf;

use avs_core::config::{ConfigSection, Settings};
use avs_core::models::{GenerationParams, SubtitleOptions};
use clap::{Args, Parser, Subcommand};

/// Stitch music and video clips into finished videos.
#[derive(Parser, Debug)]
#[command(name = "av-stitcher", version, about)]
#[command(long_about = "Builds a background-music track from a music folder, fills its length \
    with clips from a video folder, optionally burns in re-timed subtitles, and writes the \
    result with ffmpeg.\n\n\
    EXAMPLES:\n    \
    av-stitcher generate --minutes 3 --main clips/ --music bgm/\n    \
    av-stitcher generate -m 10 --main clips/ --music bgm/ --count 4 --transcripts lyrics/\n    \
    av-stitcher probe clips/a.mp4 bgm/b.mp3\n    \
    av-stitcher config reset subtitles")]
pub struct Cli {
    /// Settings file (defaults to the per-user config folder)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one or more output videos
    Generate(GenerateArgs),

    /// Print the duration of media files
    Probe {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create the settings file with defaults, repairing an existing one
    Init,
    /// Print the settings file
    Show,
    /// Restore one section (paths, logging, generation, subtitles, tools)
    Reset { section: ConfigSection },
}

/// Flags for `generate`. Unset optional flags fall back to the settings file.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Target length of each output in minutes
    #[arg(short, long)]
    pub minutes: f64,

    /// Main video clip folder
    #[arg(long = "main")]
    pub main_dir: PathBuf,

    /// Background music folder
    #[arg(long = "music")]
    pub music_dir: PathBuf,

    /// Output folder
    #[arg(short, long = "output")]
    pub output_dir: Option<PathBuf>,

    /// Video clip placed first in every output
    #[arg(long)]
    pub first_video: Option<PathBuf>,

    /// Folder of opening clips drawn before the main pool
    #[arg(long = "opening")]
    pub opening_dir: Option<PathBuf>,

    /// Number of opening clips
    #[arg(long)]
    pub opening_count: Option<usize>,

    /// Music track placed first in every output
    #[arg(long)]
    pub first_music: Option<PathBuf>,

    /// Number of outputs
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Video speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Music tempo multiplier
    #[arg(long)]
    pub audio_speed: Option<f64>,

    /// Mix each clip's own audio under the music
    #[arg(long)]
    pub keep_original_audio: bool,

    /// Use music in name order instead of shuffling
    #[arg(long)]
    pub sort_audio: bool,

    /// Transcript folder; enables subtitles
    #[arg(long = "transcripts")]
    pub transcript_dir: Option<PathBuf>,

    #[arg(long)]
    pub font_name: Option<String>,

    #[arg(long)]
    pub font_size: Option<u32>,

    /// Language hint for speech-to-text
    #[arg(long)]
    pub language: Option<String>,

    /// Font files for burn-in
    #[arg(long)]
    pub fonts_dir: Option<PathBuf>,

    /// Maximum characters per subtitle line
    #[arg(long)]
    pub max_line_chars: Option<usize>,

    /// Seed for reproducible selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print a JSON report when done
    #[arg(long)]
    pub json: bool,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl GenerateArgs {
    /// Merge flags with the settings-file defaults.
    pub fn into_params(self, settings: &Settings) -> GenerationParams {
        let defaults = &settings.generation;
        let subs = &settings.subtitles;

        let subtitles = self.transcript_dir.map(|transcript_dir| SubtitleOptions {
            transcript_dir,
            font_name: self.font_name.unwrap_or_else(|| subs.font_name.clone()),
            font_size: self.font_size.unwrap_or(subs.font_size),
            language: self.language.or_else(|| non_empty(&subs.language)),
            fonts_dir: self
                .fonts_dir
                .or_else(|| non_empty(&subs.fonts_dir).map(PathBuf::from)),
            max_line_chars: self.max_line_chars.unwrap_or(subs.max_line_chars),
        });

        GenerationParams {
            target_minutes: self.minutes,
            main_dir: self.main_dir,
            music_dir: self.music_dir,
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(&settings.paths.output_folder)),
            first_video: self.first_video,
            opening_dir: self.opening_dir,
            opening_count: self.opening_count.unwrap_or(defaults.opening_count),
            first_music: self.first_music,
            count: self.count.unwrap_or(defaults.count),
            speed_multiplier: self.speed.unwrap_or(defaults.speed_multiplier),
            keep_original_audio: self.keep_original_audio || defaults.keep_original_audio,
            audio_speed_multiplier: self.audio_speed.unwrap_or(defaults.audio_speed_multiplier),
            sort_audio_by_name: self.sort_audio || defaults.sort_audio_by_name,
            subtitles,
            seed: self.seed,
        }
    }
}
