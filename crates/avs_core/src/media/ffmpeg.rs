//! Running ffmpeg with logging, diagnostics and progress tracking.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use super::error::{MediaError, MediaResult};
use crate::logging::RunLogger;

/// Progress notifications are emitted at least this many points apart.
pub const PROGRESS_STEP: u32 = 10;

/// Converts ffmpeg `-progress` key/value lines into throttled percentages.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    expected_secs: f64,
    last_percent: Option<u32>,
}

impl ProgressTracker {
    /// Track progress towards an output of `expected_secs`.
    pub fn new(expected_secs: f64) -> Self {
        Self {
            expected_secs,
            last_percent: None,
        }
    }

    /// Feed one line of the progress stream.
    ///
    /// Returns a percentage when it should be reported.
    pub fn feed(&mut self, line: &str) -> Option<u32> {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("out_time_ms=") {
            // Despite the name, the value is in microseconds.
            let micros: f64 = value.trim().parse().ok()?;
            if self.expected_secs <= 0.0 {
                return None;
            }
            let fraction = (micros / 1_000_000.0 / self.expected_secs).clamp(0.0, 1.0);
            self.update((fraction * 100.0).round() as u32)
        } else if line == "progress=end" {
            self.update(100)
        } else {
            None
        }
    }

    /// Report completion if it has not been reported yet.
    pub fn finish(&mut self) -> Option<u32> {
        self.update(100)
    }

    fn update(&mut self, percent: u32) -> Option<u32> {
        let percent = percent.min(100);
        match self.last_percent {
            Some(last) if percent == 100 && last < 100 => {}
            Some(last) if percent < last + PROGRESS_STEP => return None,
            _ => {}
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}

/// The last non-empty stderr line, used as the failure message.
pub fn last_diagnostic(stderr_lines: &[String]) -> String {
    stderr_lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "ffmpeg exited with an error".to_string())
}

/// Runs the ffmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: PathBuf,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ffmpeg".to_string())
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.program.display(), args.join(" "))
    }

    /// Run to completion, capturing output into the logger's tail.
    pub fn run(&self, args: &[String], logger: &RunLogger) -> MediaResult<()> {
        logger.command(&self.command_line(args));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::spawn(self.tool_name(), e))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            logger.output_line(line, false);
        }
        let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string)
            .collect();
        for line in &stderr {
            logger.output_line(line, true);
        }

        if !output.status.success() {
            logger.show_tail("ffmpeg output");
            return Err(MediaError::command_failed(
                self.tool_name(),
                output.status.code().unwrap_or(-1),
                last_diagnostic(&stderr),
            ));
        }
        Ok(())
    }

    /// Run with `-progress pipe:1`, reporting percentages of `expected_secs`.
    ///
    /// stderr is drained on a helper thread while the progress stream on
    /// stdout is read, so neither pipe can fill up and stall ffmpeg.
    pub fn run_with_progress(
        &self,
        args: &[String],
        expected_secs: f64,
        logger: &RunLogger,
        on_progress: &mut dyn FnMut(u32),
    ) -> MediaResult<()> {
        let mut full_args: Vec<String> = args.to_vec();
        full_args.extend(["-progress", "pipe:1", "-nostats"].iter().map(|s| s.to_string()));
        logger.command(&self.command_line(&full_args));
        logger.reset_progress();

        let mut child = Command::new(&self.program)
            .args(&full_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::spawn(self.tool_name(), e))?;

        let stderr_reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                BufReader::new(stderr)
                    .lines()
                    .map_while(Result::ok)
                    .collect::<Vec<String>>()
            })
        });

        let mut tracker = ProgressTracker::new(expected_secs);
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if let Some(percent) = tracker.feed(&line) {
                    logger.progress(percent);
                    on_progress(percent);
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| MediaError::io("waiting for ffmpeg", e))?;

        let stderr: Vec<String> = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        for line in &stderr {
            logger.output_line(line, true);
        }

        if !status.success() {
            logger.show_tail("ffmpeg output");
            return Err(MediaError::command_failed(
                self.tool_name(),
                status.code().unwrap_or(-1),
                last_diagnostic(&stderr),
            ));
        }

        if let Some(percent) = tracker.finish() {
            logger.progress(percent);
            on_progress(percent);
        }
        Ok(())
    }
}
