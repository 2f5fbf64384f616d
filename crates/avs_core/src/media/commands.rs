//! Argument lists for the ffmpeg invocations of one output.
//!
//! Everything here is pure: the steps build arguments with these functions
//! and hand them to [`super::FfmpegRunner`].

use std::path::Path;

use super::filters::{atempo_chain, concat_list_path, escape_filter_path, setpts_filter};
use crate::models::{is_unit_speed, Clip, PlaylistEntry};

const VIDEO_ENCODE: [&str; 6] = ["-c:v", "libx264", "-preset", "fast", "-pix_fmt", "yuv420p"];

fn s(value: &str) -> String {
    value.to_string()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Concatenate audio clips and apply the tempo chain into an MP3.
///
/// Inputs are normalized to a common sample rate and layout before the
/// `concat` filter.
pub fn audio_export_args(clips: &[Clip], tempo: f64, output: &Path) -> Vec<String> {
    let mut args = vec![s("-y")];
    for clip in clips {
        args.push(s("-i"));
        args.push(path_arg(&clip.path));
    }

    let mut graph = String::new();
    let mut labels = String::new();
    for i in 0..clips.len() {
        graph.push_str(&format!(
            "[{i}:a]aformat=sample_rates=44100:channel_layouts=stereo[a{i}];"
        ));
        labels.push_str(&format!("[a{i}]"));
    }
    if is_unit_speed(tempo) {
        graph.push_str(&format!("{labels}concat=n={}:v=0:a=1[aout]", clips.len()));
    } else {
        graph.push_str(&format!(
            "{labels}concat=n={}:v=0:a=1[cat];[cat]{}[aout]",
            clips.len(),
            atempo_chain(tempo)
        ));
    }

    args.extend([s("-filter_complex"), graph, s("-map"), s("[aout]")]);
    args.extend(["-c:a", "libmp3lame", "-b:a", "320k"].map(s));
    args.push(path_arg(output));
    args
}

/// Contents of a concat-demuxer list file.
///
/// Trimmed entries get an `outpoint` so only their first seconds are read.
pub fn concat_list_contents(entries: &[PlaylistEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("file {}\n", concat_list_path(&entry.clip.path)));
        if let Some(trim) = entry.trim_secs {
            out.push_str(&format!("outpoint {:.6}\n", trim));
        }
    }
    out
}

/// Concatenate through the demuxer, keeping each clip's audio.
pub fn concat_with_audio_args(list_file: &Path, speed: f64, output: &Path) -> Vec<String> {
    let mut args = ["-y", "-f", "concat", "-safe", "0", "-i"].map(s).to_vec();
    args.push(path_arg(list_file));

    if !is_unit_speed(speed) {
        args.push(s("-filter_complex"));
        args.push(format!(
            "[0:v]{}[outv];[0:a]{}[outa]",
            setpts_filter(speed),
            atempo_chain(speed)
        ));
        args.extend(["-map", "[outv]", "-map", "[outa]"].map(s));
    }

    args.extend(VIDEO_ENCODE.map(s));
    args.extend(["-c:a", "aac"].map(s));
    args.push(path_arg(output));
    args
}

/// Concatenate video streams only, one input per entry.
pub fn concat_video_only_args(entries: &[PlaylistEntry], speed: f64, output: &Path) -> Vec<String> {
    let mut args = vec![s("-y")];
    for entry in entries {
        if let Some(trim) = entry.trim_secs {
            args.push(s("-t"));
            args.push(format!("{:.6}", trim));
        }
        args.push(s("-i"));
        args.push(path_arg(&entry.clip.path));
    }

    let mut graph = String::new();
    let mut labels = String::new();
    let scale = !is_unit_speed(speed);
    for i in 0..entries.len() {
        if scale {
            graph.push_str(&format!("[{i}:v]{}[v{i}];", setpts_filter(speed)));
            labels.push_str(&format!("[v{i}]"));
        } else {
            labels.push_str(&format!("[{i}:v]"));
        }
    }
    graph.push_str(&format!("{labels}concat=n={}:v=1:a=0[outv]", entries.len()));

    args.extend([s("-filter_complex"), graph, s("-map"), s("[outv]")]);
    args.extend(VIDEO_ENCODE.map(s));
    args.push(path_arg(output));
    args
}

/// Put the background music under the concatenated video.
pub fn mux_args(video: &Path, music: &Path, output: &Path, keep_original_audio: bool) -> Vec<String> {
    let mut args = vec![s("-y"), s("-i"), path_arg(video), s("-i"), path_arg(music)];

    if keep_original_audio {
        args.push(s("-filter_complex"));
        args.push(s(
            "[0:a][1:a]amix=inputs=2:duration=shortest:dropout_transition=2:weights=1 1.5:normalize=0[aout]",
        ));
        args.extend(["-map", "0:v:0", "-map", "[aout]", "-c:v", "copy"].map(s));
        args.extend(["-c:a", "aac", "-b:a", "320k", "-shortest"].map(s));
    } else {
        args.extend(["-c:v", "copy", "-filter:a", "volume=1.0", "-c:a", "aac", "-b:a", "320k"].map(s));
        args.extend(["-map", "0:v:0", "-map", "1:a:0", "-shortest"].map(s));
    }

    args.push(path_arg(output));
    args
}

/// Burn an ASS subtitle file into the video.
pub fn burn_args(input: &Path, subtitles: &Path, fonts_dir: Option<&Path>, output: &Path) -> Vec<String> {
    let mut filter = format!("subtitles='{}'", escape_filter_path(subtitles));
    if let Some(fonts) = fonts_dir {
        filter.push_str(&format!(":fontsdir='{}'", escape_filter_path(fonts)));
    }

    let mut args = vec![s("-y"), s("-i"), path_arg(input), s("-vf"), filter];
    args.extend(VIDEO_ENCODE.map(s));
    args.extend(["-c:a", "copy"].map(s));
    args.push(path_arg(output));
    args
}
