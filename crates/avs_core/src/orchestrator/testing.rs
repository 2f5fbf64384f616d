//! Fixtures shared by the orchestrator tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{Context, ProgressEvent, Toolbox};
use crate::config::Settings;
use crate::logging::{LogConfig, RunLogger};
use crate::media::{FfmpegRunner, FixedDurations};
use crate::models::GenerationParams;
use crate::subtitles::{CannedTranscriber, SubtitleCue};

pub(crate) type Events = Arc<Mutex<Vec<ProgressEvent>>>;

/// Music `a.mp3`/`b.mp3` and clips `v1.mp4`/`v2.mp4` under `root`,
/// one-minute target, seeded.
pub(crate) fn params(root: &Path) -> GenerationParams {
    let main_dir = root.join("main");
    let music_dir = root.join("music");
    let output_dir = root.join("out");
    for dir in [&main_dir, &music_dir, &output_dir] {
        fs::create_dir_all(dir).unwrap();
    }
    for name in ["a.mp3", "b.mp3"] {
        fs::write(music_dir.join(name), b"music").unwrap();
    }
    for name in ["v1.mp4", "v2.mp4"] {
        fs::write(main_dir.join(name), b"video").unwrap();
    }

    GenerationParams {
        target_minutes: 1.0,
        main_dir,
        music_dir,
        output_dir,
        first_video: None,
        opening_dir: None,
        opening_count: 0,
        first_music: None,
        count: 1,
        speed_multiplier: 1.0,
        keep_original_audio: false,
        audio_speed_multiplier: 1.0,
        sort_audio_by_name: true,
        subtitles: None,
        seed: Some(7),
    }
}

/// Durations for the files created by [`params`].
pub(crate) fn durations() -> FixedDurations {
    FixedDurations::new(&[
        ("a.mp3", 40.0),
        ("b.mp3", 40.0),
        ("v1.mp4", 25.0),
        ("v2.mp4", 25.0),
    ])
}

pub(crate) fn toolbox(ffmpeg: &Path, cues: Vec<SubtitleCue>) -> Toolbox {
    Toolbox {
        prober: Arc::new(durations()),
        ffmpeg: FfmpegRunner::new(ffmpeg),
        transcriber: Arc::new(CannedTranscriber::new(cues)),
    }
}

/// A context whose progress events are collected.
pub(crate) fn context_with(params: GenerationParams, tools: &Toolbox) -> (Context, Events) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let logger = Arc::new(RunLogger::detached("test", LogConfig::default(), None));
    let ctx = Context::new(params, Settings::default(), 1, 1, logger, tools)
        .with_progress_callback(Arc::new(move |event: ProgressEvent| sink.lock().push(event)));
    (ctx, events)
}

/// Context over [`params`] with an ffmpeg that is never expected to run.
pub(crate) fn test_context(root: &Path) -> (Context, Events) {
    let tools = toolbox(Path::new("/nonexistent/ffmpeg"), Vec::new());
    context_with(params(root), &tools)
}

/// Shell script standing in for ffmpeg: creates its last file argument and
/// reports completion on the progress pipe.
#[cfg(unix)]
pub(crate) fn fake_ffmpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "ffmpeg",
        r#"#!/bin/sh
out=""
for a in "$@"; do
  case "$a" in
    -*|pipe:1) ;;
    *) out="$a" ;;
  esac
done
echo "$@" >> "$(dirname "$0")/calls.log"
: > "$out"
echo "out_time_ms=1000000"
echo "progress=end"
"#,
    )
}

/// Shell script standing in for an ffmpeg that rejects its input.
#[cfg(unix)]
pub(crate) fn failing_ffmpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "ffmpeg_fail",
        "#!/bin/sh\necho 'Input #0' >&2\necho 'Invalid data found when processing input' >&2\nexit 1\n",
    )
}

/// Arguments of every fake ffmpeg call, one line per call.
#[cfg(unix)]
pub(crate) fn ffmpeg_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
