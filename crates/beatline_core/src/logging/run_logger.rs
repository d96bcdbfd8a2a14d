//! Per-run logger with file and callback output.
//!
//! Every render gets its own log file under the logs folder. Tool stderr is
//! kept in a bounded tail buffer and only replayed when a run fails, unless
//! compact mode is off.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Log sink for one pipeline run.
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl RunLogger {
    /// Create a logger writing to `<log_dir>/<run_name>.log`.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            run_name,
            log_path: Some(log_path),
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            callback: Mutex::new(callback),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        })
    }

    /// Logger without a backing file; messages only reach the callback.
    pub fn detached(run_name: impl Into<String>, config: LogConfig) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            callback: Mutex::new(None),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        }
    }

    /// Attach or replace the line callback.
    pub fn set_callback(&self, callback: LogCallback) {
        *self.callback.lock() = Some(callback);
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Path of the log file, if this logger writes one.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the given level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a phase marker.
    pub fn phase(&self, name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log an external command, honoring the pretty-command setting.
    pub fn command(&self, program: &str, args: &[String]) {
        if self.config.pretty_command {
            self.info("--- command ---");
            let mut lines = vec![program.to_string()];
            lines.extend(args.iter().map(|a| quote_arg(a)));
            self.info(&lines.join(" \\\n  "));
            self.info("---------------");
        } else {
            let line = std::iter::once(program.to_string())
                .chain(args.iter().map(|a| quote_arg(a)))
                .collect::<Vec<_>>()
                .join(" ");
            self.log(LogLevel::Info, &MessagePrefix::Command.format(&line));
        }
    }

    /// Record one line of tool output.
    ///
    /// Lines always go to the tail buffer; in compact mode that is all.
    pub fn output_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if !self.config.compact {
            self.output(&self.format_message(&format!("[stderr] {}", line)));
        }
    }

    /// Replay the tail buffer, typically after a tool failure.
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.iter() {
            self.output(&self.format_message(line));
        }
    }

    /// Current tail buffer contents.
    pub fn tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Quote an argument for display when it contains shell-significant characters.
fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || "[];'\"".contains(c)) {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}

/// Replace characters that are not safe in file names.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
