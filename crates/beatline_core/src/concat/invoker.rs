//! Runs ffmpeg over a concatenation plan.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::filter_graph::FilterGraph;
use super::types::{ConcatError, ConcatResult};
use crate::config::{AudioSettings, ConcatSettings};
use crate::logging::RunLogger;
use crate::orchestrator::CancelHandle;
use crate::timeline::ConcatPlan;

/// How often the child is polled for exit and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// ffmpeg invocation for one plan.
pub struct ConcatInvoker {
    audio: AudioSettings,
    concat: ConcatSettings,
    logger: Option<Arc<RunLogger>>,
}

impl ConcatInvoker {
    pub fn new(audio: AudioSettings, concat: ConcatSettings) -> Self {
        Self {
            audio,
            concat,
            logger: None,
        }
    }

    /// Mirror the command and ffmpeg's stderr into a run log.
    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// ffmpeg program name or path.
    pub fn program(&self) -> &str {
        &self.concat.ffmpeg_path
    }

    /// Arguments that `invoke` would pass to ffmpeg.
    pub fn command(&self, plan: &ConcatPlan, output_path: &Path) -> Vec<String> {
        FilterGraph::new(plan, &self.audio, &self.concat).build(output_path)
    }

    /// Concatenate the plan into `output_path`.
    ///
    /// Blocks until ffmpeg exits, the handle is cancelled, or the configured
    /// timeout expires. A killed run leaves no partial output behind.
    pub fn invoke(
        &self,
        plan: &ConcatPlan,
        output_path: &Path,
        cancel: &CancelHandle,
    ) -> ConcatResult<PathBuf> {
        if cancel.is_cancelled() {
            return Err(ConcatError::Cancelled);
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConcatError::io("creating output directory", e))?;
        }

        let args = self.command(plan, output_path);
        let program = self.program();

        tracing::debug!("Running ffmpeg: {} {}", program, args.join(" "));
        if let Some(ref logger) = self.logger {
            logger.command(program, &args);
        }

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ConcatError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stderr_reader = self.spawn_stderr_reader(&mut child);
        let status = match self.wait(&mut child, cancel) {
            Ok(status) => status,
            Err(e) => {
                // A grandchild may still hold the pipe open, so the reader is
                // left to finish on its own.
                remove_partial(output_path);
                return Err(e);
            }
        };
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            if let Some(ref logger) = self.logger {
                logger.show_tail("ffmpeg");
            }
            remove_partial(output_path);
            return Err(ConcatError::ConcatenationFailed {
                exit_code,
                message: stderr.trim_end().to_string(),
            });
        }

        let written = fs::metadata(output_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !written {
            return Err(ConcatError::OutputMissing(output_path.to_path_buf()));
        }

        Ok(output_path.to_path_buf())
    }

    /// Drain stderr on a separate thread so ffmpeg never blocks on a full pipe.
    fn spawn_stderr_reader(&self, child: &mut Child) -> Option<thread::JoinHandle<String>> {
        let stderr = child.stderr.take()?;
        let logger = self.logger.clone();

        Some(thread::spawn(move || {
            let mut collected = String::new();
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if let Some(ref logger) = logger {
                    logger.output_line(&line);
                }
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        }))
    }

    /// Poll the child until it exits, killing it on cancel or timeout.
    fn wait(
        &self,
        child: &mut Child,
        cancel: &CancelHandle,
    ) -> ConcatResult<std::process::ExitStatus> {
        let started = Instant::now();
        let timeout = match self.concat.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| ConcatError::io("waiting for ffmpeg", e))?
            {
                return Ok(status);
            }

            if cancel.is_cancelled() {
                tracing::info!("Cancelling ffmpeg");
                kill(child);
                return Err(ConcatError::Cancelled);
            }

            if timeout.is_some_and(|t| started.elapsed() >= t) {
                tracing::warn!("ffmpeg exceeded {}s, killing", self.concat.timeout_secs);
                kill(child);
                return Err(ConcatError::TimedOut(self.concat.timeout_secs));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
}
