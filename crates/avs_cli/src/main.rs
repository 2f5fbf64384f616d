//! AV Stitcher command-line entry point.

mod args;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use avs_core::config::ConfigManager;
use avs_core::logging::{init_tracing, init_tracing_with_file, LogLevel};
use avs_core::media::{DurationProbe, FfprobeProber};
use avs_core::models::{Clip, MediaKind, Stage};
use avs_core::orchestrator::{BatchRunner, ProgressEvent, Toolbox};
use clap::Parser;
use directories::ProjectDirs;
use indicatif::{ProgressBar, ProgressStyle};

use args::{Cli, Command, ConfigAction, GenerateArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    match cli.command {
        Command::Generate(args) => generate(&config_path, args, level),
        Command::Probe { files, json } => {
            init_tracing(LogLevel::Warn);
            probe(&config_path, &files, json)
        }
        Command::Config { action } => {
            init_tracing(level);
            config(&config_path, action)
        }
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "av-stitcher")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("settings.toml"))
}

fn load_config(path: &Path) -> Result<ConfigManager> {
    let mut config = ConfigManager::new(path);
    config
        .load_or_create()
        .with_context(|| format!("loading settings from {}", path.display()))?;
    Ok(config)
}

fn generate(config_path: &Path, args: GenerateArgs, level: LogLevel) -> Result<()> {
    let config = load_config(config_path)?;
    config
        .ensure_dirs_exist()
        .context("creating output and log folders")?;
    let _guard = init_tracing_with_file(level, &config.logs_folder());

    let json = args.json;
    let settings = config.settings().clone();
    let params = args.into_params(&settings);
    let tools = Toolbox::from_settings(&settings.tools);

    let bar = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
        )?
        .progress_chars("#>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel::<ProgressEvent>();
    let mut runner = BatchRunner::new(settings, config.logs_folder(), tools)
        .with_progress_callback(Arc::new(move |event: ProgressEvent| {
            let _ = tx.send(event);
        }));
    if level == LogLevel::Debug {
        let printer = bar.clone();
        runner = runner.with_log_callback(Arc::new(move |line: &str| printer.println(line)));
    }

    let worker = thread::spawn(move || runner.run(&params));

    // Ends when the runner, and with it the sender, is dropped.
    for event in rx {
        if event.stage == Stage::Complete {
            bar.println(format!("[{}/{}] done", event.run_index, event.run_total));
            continue;
        }
        bar.set_message(format!(
            "[{}/{}] {}",
            event.run_index, event.run_total, event.stage
        ));
        bar.set_position(u64::from(event.percent));
    }

    let result = worker
        .join()
        .map_err(|_| anyhow!("generation thread panicked"))?;
    bar.finish_and_clear();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for output in &report.outputs {
            println!("{}", output.video_path.display());
        }
    }
    Ok(())
}

fn probe(config_path: &Path, files: &[PathBuf], json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let prober = FfprobeProber::new(&config.settings().tools.ffprobe);

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let kind = if MediaKind::Video.accepts(path) {
            MediaKind::Video
        } else {
            MediaKind::Audio
        };
        let secs = prober.probe(&Clip::new(path, kind));
        if secs <= 0.0 {
            tracing::warn!("Could not determine the duration of {}", path.display());
        }
        results.push((path, secs));
    }

    if json {
        let entries: Vec<_> = results
            .iter()
            .map(|(path, secs)| serde_json::json!({ "path": path, "seconds": secs }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (path, secs) in results {
            println!("{:>10.3}s  {}", secs, path.display());
        }
    }
    Ok(())
}

fn config(config_path: &Path, action: ConfigAction) -> Result<()> {
    let mut config = load_config(config_path)?;
    match action {
        ConfigAction::Init => println!("{}", config.path().display()),
        ConfigAction::Show => {
            let content = fs::read_to_string(config.path())
                .with_context(|| format!("reading {}", config.path().display()))?;
            print!("{}", content);
        }
        ConfigAction::Reset { section } => {
            config
                .reset_section(section)
                .with_context(|| format!("resetting [{}]", section.table_name()))?;
            println!(
                "Reset [{}] in {}",
                section.table_name(),
                config.path().display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use avs_core::config::ConfigSection;
    use tempfile::tempdir;

    #[test]
    fn config_commands_manage_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        config(&path, ConfigAction::Init).unwrap();
        assert!(path.exists());

        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("font_size = 64", "font_size = 30");
        fs::write(&path, edited).unwrap();
        assert_eq!(load_config(&path).unwrap().settings().subtitles.font_size, 30);

        config(
            &path,
            ConfigAction::Reset {
                section: ConfigSection::Subtitles,
            },
        )
        .unwrap();
        assert_eq!(load_config(&path).unwrap().settings().subtitles.font_size, 64);
    }

    #[test]
    fn default_config_is_toml() {
        assert_eq!(
            default_config_path().extension().and_then(|e| e.to_str()),
            Some("toml")
        );
    }
}
