//! Speech-to-text fallback.
//!
//! When per-clip transcripts are missing, the finished audio is handed to a
//! [`Transcriber`]. The shipped implementation drives the `whisper` command
//! line and reads back the SRT it writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::SubtitleError;
use super::parsers::parse_srt;
use super::reflow::refine_segments;
use super::types::{SubtitleCue, MIN_CUE_SECS};

/// Produces timed text for a whole audio file.
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`. `language` is an optional language code hint.
    fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Vec<SubtitleCue>, SubtitleError>;
}

/// Runs `whisper <audio> --model <model> --output_format srt --output_dir <tmp>`.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    program: PathBuf,
    model: String,
    /// Parent of the per-call scratch folder (`None` = system temp dir).
    scratch_root: Option<PathBuf>,
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self::new("whisper", "base")
    }
}

impl WhisperCli {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
            scratch_root: None,
        }
    }

    /// Create scratch folders under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn build_args(
        &self,
        audio: &Path,
        output_dir: &Path,
        language: Option<&str>,
    ) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "srt".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
        ];
        if let Some(lang) = language {
            args.push("--language".to_string());
            args.push(lang.to_string());
        }
        args
    }

    fn run_in(
        &self,
        work_dir: &Path,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Vec<SubtitleCue>, SubtitleError> {
        let args = self.build_args(audio, work_dir, language);
        tracing::debug!("$ {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                SubtitleError::Transcription(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("whisper exited with an error")
                .to_string();
            return Err(SubtitleError::Transcription(message));
        }

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let srt_path = work_dir.join(format!("{}.srt", stem));
        let content =
            fs::read_to_string(&srt_path).map_err(|e| SubtitleError::read(&srt_path, e))?;
        Ok(parse_srt(&content))
    }
}

impl Transcriber for WhisperCli {
    fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Vec<SubtitleCue>, SubtitleError> {
        let root = self.scratch_root.clone().unwrap_or_else(std::env::temp_dir);
        // Removed on drop, whichever way run_in returns.
        let work_dir = tempfile::Builder::new()
            .prefix("avs_whisper_")
            .tempdir_in(&root)
            .map_err(|e| SubtitleError::write(&root, e))?;

        self.run_in(work_dir.path(), audio, language)
    }
}

/// Drop empty segments and make every interval valid.
pub fn clean_segments(cues: Vec<SubtitleCue>) -> Vec<SubtitleCue> {
    cues.into_iter()
        .filter_map(|cue| {
            let text = cue.text.trim();
            if text.is_empty() {
                return None;
            }
            let start = cue.start.max(0.0);
            let end = cue.end.max(start + MIN_CUE_SECS);
            Some(SubtitleCue::new(start, end, text))
        })
        .collect()
}

/// Transcribe the whole audio export and prepare the cues for display.
pub fn transcribe_and_refine(
    transcriber: &dyn Transcriber,
    audio: &Path,
    language: Option<&str>,
    max_chars: usize,
) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let language = language.map(str::trim).filter(|l| !l.is_empty());
    let segments = transcriber.transcribe(audio, language)?;
    Ok(refine_segments(clean_segments(segments), max_chars))
}


#[cfg(test)]
mod tests {
    use super::testing::CannedTranscriber;
    use super::*;

    #[test]
    fn whisper_args() {
        let whisper = WhisperCli::new("whisper", "small");
        let args = whisper.build_args(Path::new("/a/bgm.mp3"), Path::new("/tmp/w"), Some("zh"));
        assert_eq!(
            args,
            vec![
                "/a/bgm.mp3",
                "--model",
                "small",
                "--output_format",
                "srt",
                "--output_dir",
                "/tmp/w",
                "--language",
                "zh"
            ]
        );
    }

    #[test]
    fn cleaning_fixes_intervals() {
        let cues = clean_segments(vec![
            SubtitleCue::new(-0.5, 1.0, " hi "),
            SubtitleCue::new(2.0, 1.0, "back"),
            SubtitleCue::new(3.0, 4.0, "   "),
        ]);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], SubtitleCue::new(0.0, 1.0, "hi"));
        assert!((cues[1].end - 2.01).abs() < 1e-9);
    }

    #[test]
    fn refine_after_transcription() {
        let canned = CannedTranscriber::new(vec![SubtitleCue::new(1.0, 1.0, "word word word")]);
        let cues = transcribe_and_refine(&canned, Path::new("a.mp3"), Some("  "), 9).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "word word\nword");
        assert!((cues[0].end - 1.05).abs() < 1e-9);
        assert_eq!(*canned.languages.lock(), vec![None]);
    }

    #[test]
    fn missing_program_fails() {
        let whisper = WhisperCli::new("/nonexistent/whisper-bin", "base");
        let err = whisper.transcribe(Path::new("a.mp3"), None).unwrap_err();
        assert!(matches!(err, SubtitleError::Transcription(_)));
    }

    #[cfg(unix)]
    #[test]
    fn reads_the_srt_whisper_writes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-whisper");
        let body = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output_dir" ]; then out="$2"; fi
  shift
done
printf '1\n00:00:00,000 --> 00:00:01,500\nhello\n' > "$out/track.srt"
"#;
        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = dir.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        let whisper = WhisperCli::new(&script, "base").with_scratch_root(&scratch);
        let cues = whisper.transcribe(Path::new("/music/track.mp3"), Some("en")).unwrap();
        assert_eq!(cues, vec![SubtitleCue::new(0.0, 1.5, "hello")]);
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn scratch_folder_removed_when_output_missing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("silent-whisper");
        fs::write(&script, "#!/bin/sh
exit 0
").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = dir.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        let whisper = WhisperCli::new(&script, "base").with_scratch_root(&scratch);
        let err = whisper.transcribe(Path::new("/music/track.mp3"), None).unwrap_err();
        assert!(matches!(err, SubtitleError::ReadError { .. }));
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }
}
