//! Output file naming.

/// Background audio name for a single output.
pub const AUDIO_EXPORT_NAME: &str = "bgm_final.mp3";

/// Duration tag in `MMmSSs` form, rounded to whole seconds.
pub fn duration_tag(duration_ms: u64) -> String {
    let total_secs = (duration_ms + 500) / 1000;
    format!("{:02}m{:02}s", total_secs / 60, total_secs % 60)
}

fn index_width(total: usize) -> usize {
    total.to_string().len().max(2)
}

/// Background audio file name for output `index` (1-based) of `total`.
pub fn audio_file_name(index: usize, total: usize) -> String {
    if total <= 1 {
        return AUDIO_EXPORT_NAME.to_string();
    }
    format!("bgm_final_{:0width$}.mp3", index, width = index_width(total))
}

/// Final video file name for output `index` (1-based) of `total`.
pub fn video_file_name(tag: &str, index: usize, total: usize) -> String {
    if total <= 1 {
        return format!("final_video_{}.mp4", tag);
    }
    format!(
        "final_video_{}_{:0width$}.mp4",
        tag,
        index,
        width = index_width(total)
    )
}
