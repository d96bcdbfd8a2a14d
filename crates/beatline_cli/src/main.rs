//! Beatline binary entry point.

mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use beatline_core::concat::ConcatInvoker;
use beatline_core::config::{ConfigManager, Settings};
use beatline_core::logging::{init_tracing, LogConfig, RunLogger};
use beatline_core::models::{ReconciledBeat, Script};
use beatline_core::orchestrator::{AudioPipeline, Context};
use clap::Parser;
use directories::ProjectDirs;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut manager = ConfigManager::new(&config_path);
    manager
        .load_or_create()
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let level = manager.settings().logging.level.raised_by(cli.verbose);
    init_tracing(level);
    tracing::debug!("Config: {}", config_path.display());

    match cli.command {
        Command::Plan {
            script,
            json,
            show_command,
        } => plan(manager.into_settings(), &script, json, show_command),
        Command::Render {
            script,
            output,
            timing,
        } => {
            manager
                .ensure_dirs_exist()
                .context("creating output and log folders")?;
            render(manager.into_settings(), &script, output, timing)
        }
        Command::Config => {
            let content = fs::read_to_string(manager.path())
                .with_context(|| format!("reading {}", manager.path().display()))?;
            println!("# {}", manager.path().display());
            print!("{}", content);
            Ok(())
        }
    }
}

fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "beatline")
        .context("could not determine the platform config directory")?;
    Ok(dirs.config_dir().join("beatline.toml"))
}

fn load_script(path: &Path) -> Result<Script> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?;
    Script::from_json(&json).with_context(|| format!("parsing script {}", path.display()))
}

/// Run name and default output file derived from the script path.
fn run_name(script: &Path) -> String {
    script
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "beatline".to_string())
}

fn default_output(settings: &Settings, name: &str) -> PathBuf {
    Path::new(&settings.paths.output_folder).join(format!("{}.m4a", name))
}

fn plan(settings: Settings, script_path: &Path, json: bool, show_command: bool) -> Result<()> {
    let script = load_script(script_path)?;
    let name = run_name(script_path);
    let output = default_output(&settings, &name);

    let pipeline = AudioPipeline::new(settings);
    let timeline = pipeline
        .reconcile(&script)
        .with_context(|| format!("reconciling {}", script_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline.beats)?);
    } else {
        print_table(&timeline.beats);
    }

    if show_command {
        let invoker = ConcatInvoker::new(
            pipeline.settings().audio.clone(),
            pipeline.settings().concat.clone(),
        );
        let args = invoker.command(&timeline.plan, &output);
        println!();
        println!("{} {}", invoker.program(), shell_join(&args));
    }

    Ok(())
}

fn render(
    settings: Settings,
    script_path: &Path,
    output: Option<PathBuf>,
    timing: bool,
) -> Result<()> {
    let script = load_script(script_path)?;
    let name = run_name(script_path);
    let output = output.unwrap_or_else(|| default_output(&settings, &name));

    let logger = RunLogger::new(
        &name,
        &settings.paths.logs_folder,
        LogConfig::from_settings(&settings.logging),
        None,
    )
    .with_context(|| format!("creating log in {}", settings.paths.logs_folder))?;
    let logger = Arc::new(logger);

    let ctx = Context::new(script, &name, &output, Arc::clone(&logger)).with_progress_callback(
        Box::new(|phase: &str, percent: u32, _message: &str| {
            tracing::info!("[{:>3}%] {}", percent, phase);
        }),
    );

    let pipeline = AudioPipeline::new(settings);
    let result = pipeline.run(&ctx);
    logger.close();
    let run = result.with_context(|| match logger.log_path() {
        Some(log) => format!("render failed, see {}", log.display()),
        None => "render failed".to_string(),
    })?;

    if timing {
        let timing_path = run.audio_path.with_extension("timing.json");
        fs::write(
            &timing_path,
            serde_json::to_string_pretty(&run.timeline.beats)?,
        )
        .with_context(|| format!("writing {}", timing_path.display()))?;
        println!("Timing: {}", timing_path.display());
    }

    println!(
        "Wrote {} ({:.2}s)",
        run.audio_path.display(),
        run.timeline.total_duration()
    );
    Ok(())
}

fn print_table(beats: &[ReconciledBeat]) {
    println!(
        "{:>4}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}",
        "beat", "start", "duration", "audio", "movie", "silence"
    );
    for (index, beat) in beats.iter().enumerate() {
        println!(
            "{:>4}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9.3}",
            index,
            beat.start_at,
            beat.duration,
            beat.audio_duration,
            beat.movie_duration,
            beat.silence_duration
        );
    }
    let total = beats.last().map(ReconciledBeat::end_at).unwrap_or(0.0);
    println!("total {:.3}s", total);
}

/// Join arguments for copy-pasting into a POSIX shell.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./:=,".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
