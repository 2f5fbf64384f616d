//! Audio step - builds the background music track and exports it.

use std::fs;

use crate::media::commands::audio_export_args;
use crate::media::DurationProbe;
use crate::models::{is_unit_speed, scan_clips, Clip, MediaKind, Stage};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{AudioOutput, Context, RunState, StepOutcome};
use crate::selection::{plan_audio_playlist, AudioRequest};

/// Picks music until the target length is reached, then writes one MP3.
///
/// A single track at unit tempo is copied as-is rather than re-encoded.
pub struct AudioStep;

impl AudioStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AudioStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AudioStep {
    fn name(&self) -> &str {
        "Audio"
    }

    fn stage(&self) -> Stage {
        Stage::Audio
    }

    fn description(&self) -> &str {
        "Build and export background music"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.params.music_dir.is_dir() {
            return Err(StepError::file_not_found(
                ctx.params.music_dir.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let params = &ctx.params;
        let pool = scan_clips(&params.music_dir, MediaKind::Audio)
            .map_err(|e| StepError::io_error("scanning music folder", e))?;
        let first = params.first_music.as_ref().map(Clip::audio);

        let request = AudioRequest {
            pool: &pool,
            first: first.as_ref(),
            target_ms: params.target_ms(),
            tempo: params.audio_speed_multiplier,
            sequential: params.sort_audio_by_name,
        };
        let playlist = ctx.with_rng(|rng| plan_audio_playlist(&request, &ctx.probe, rng))?;

        ctx.logger.info(&format!(
            "Selected {} music track(s), {:.2}s of source for a {:.2}s target",
            playlist.clips.len(),
            playlist.total_source_secs(),
            params.target_secs()
        ));
        for clip in &playlist.clips {
            ctx.logger.debug(&format!("  {}", clip));
        }

        let export_path = ctx.audio_export_path();
        state.track_temp(&export_path);

        let mut copied = false;
        if playlist.clips.len() == 1 && is_unit_speed(playlist.tempo) {
            match fs::copy(&playlist.clips[0].path, &export_path) {
                Ok(_) => {
                    ctx.logger.info("Single track at unit tempo, copied without re-encoding");
                    copied = true;
                }
                Err(e) => ctx
                    .logger
                    .warn(&format!("Copy failed ({}), re-encoding instead", e)),
            }
        }
        if !copied {
            let args = audio_export_args(&playlist.clips, playlist.tempo, &export_path);
            ctx.ffmpeg.run(&args, &ctx.logger)?;
        }

        let probed = ctx.probe.probe(&Clip::audio(&export_path));
        let duration_secs = if probed > 0.0 {
            probed
        } else {
            ctx.logger.warn(
                "Could not probe the exported music, using the computed duration",
            );
            playlist.expected_output_secs()
        };
        let duration_ms = (duration_secs * 1000.0).round() as u64;
        ctx.logger.info(&format!(
            "Music track: {} ({:.2}s)",
            export_path.display(),
            duration_secs
        ));

        state.audio = Some(AudioOutput {
            export_path,
            duration_ms,
            used_files: playlist
                .clips
                .iter()
                .map(|c| c.path.display().to_string())
                .collect(),
            offsets: playlist.scaled_offsets(),
            tempo: playlist.tempo,
            copied,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let audio = state
            .audio
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Audio results not recorded"))?;

        if !audio.export_path.exists() {
            return Err(StepError::file_not_found(
                audio.export_path.display().to_string(),
            ));
        }
        if audio.duration_ms == 0 {
            return Err(StepError::invalid_output("Exported music has zero length"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::{context_with, params, test_context, toolbox};
    use tempfile::tempdir;

    #[test]
    fn single_track_is_copied() {
        let dir = tempdir().unwrap();
        let mut p = params(dir.path());
        p.target_minutes = 0.5;
        let tools = toolbox(std::path::Path::new("/nonexistent/ffmpeg"), Vec::new());
        let (ctx, _) = context_with(p, &tools);

        let mut state = RunState::new("run");
        let step = AudioStep::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        let audio = state.audio.as_ref().unwrap();
        assert!(audio.copied);
        assert_eq!(audio.used_files.len(), 1);
        assert_eq!(audio.duration_ms, 40_000);
        assert_eq!(fs::read(&audio.export_path).unwrap(), b"music");
        assert!(audio.export_path.ends_with("bgm_final.mp3"));
        assert_eq!(state.temp_files(), &[audio.export_path.clone()]);
    }

    #[test]
    fn empty_music_folder_is_validation_error() {
        let dir = tempdir().unwrap();
        let (ctx, _) = test_context(dir.path());
        for entry in fs::read_dir(&ctx.params.music_dir).unwrap() {
            fs::remove_file(entry.unwrap().path()).unwrap();
        }

        let mut state = RunState::new("run");
        let err = AudioStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Validation(_)));
        assert!(state.audio.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn several_tracks_are_encoded_with_tempo() {
        use crate::orchestrator::testing::{fake_ffmpeg, ffmpeg_calls};

        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let mut p = params(dir.path());
        p.audio_speed_multiplier = 1.25;
        let tools = toolbox(&fake_ffmpeg(&bin), Vec::new());
        let (ctx, _) = context_with(p, &tools);

        let mut state = RunState::new("run");
        AudioStep::new().execute(&ctx, &mut state).unwrap();

        let audio = state.audio.as_ref().unwrap();
        assert!(!audio.copied);
        // 60s x 1.25 = 75s of source: both 40s tracks
        assert_eq!(audio.used_files.len(), 2);
        // Unprobeable export falls back to 80s / 1.25
        assert_eq!(audio.duration_ms, 64_000);
        assert!((audio.offsets.total_secs() - 64.0).abs() < 1e-9);

        let calls = ffmpeg_calls(&bin);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("atempo=1.25"));
        assert!(calls[0].contains("libmp3lame"));
    }

    #[cfg(unix)]
    #[test]
    fn encoder_failure_is_command_error() {
        use crate::orchestrator::testing::failing_ffmpeg;

        let dir = tempdir().unwrap();
        let tools = toolbox(&failing_ffmpeg(&dir.path().join("bin")), Vec::new());
        let (ctx, _) = context_with(params(dir.path()), &tools);

        let mut state = RunState::new("run");
        let err = AudioStep::new().execute(&ctx, &mut state).unwrap_err();
        match err {
            StepError::CommandFailed { exit_code, message, .. } => {
                assert_eq!(exit_code, 1);
                assert_eq!(message, "Invalid data found when processing input");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(state.temp_files().len(), 1);
    }
}
