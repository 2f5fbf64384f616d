//! Filter-graph fragments and path escaping for ffmpeg.

use std::path::Path;

/// Split a tempo factor into `atempo` stages, each within [0.5, 2.0].
pub fn atempo_stages(tempo: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    let mut remaining = tempo;

    while remaining > 2.0 {
        stages.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push(0.5);
        remaining /= 0.5;
    }
    stages.push(remaining);
    stages
}

/// `atempo=a,atempo=b,...` for the given tempo.
pub fn atempo_chain(tempo: f64) -> String {
    atempo_stages(tempo)
        .iter()
        .map(|s| format!("atempo={:.6}", s))
        .collect::<Vec<_>>()
        .join(",")
}

/// `setpts` expression that plays video `speed` times faster.
pub fn setpts_filter(speed: f64) -> String {
    format!("setpts={:.6}*PTS", 1.0 / speed)
}

/// Escape a path for use inside a quoted filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Quote a path for a concat-demuxer `file` line.
pub fn concat_list_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "'\\''"))
}
