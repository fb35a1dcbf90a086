use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the `\logs` view and the log file
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }

    /// Parse a line from the compact formatter: "LEVEL target: message"
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let levels = [
            ("TRACE ", Level::TRACE),
            ("DEBUG ", Level::DEBUG),
            ("INFO ", Level::INFO),
            ("WARN ", Level::WARN),
            ("ERROR ", Level::ERROR),
        ];
        let Some((level, rest)) = levels.iter().find_map(|(prefix, level)| {
            line.strip_prefix(prefix).map(|rest| (*level, rest.trim_start()))
        }) else {
            return Some(Self::new(Level::INFO, "general", line.to_string()));
        };

        // A target never contains spaces; anything else is part of the message
        let (target, message) = match rest.split_once(':') {
            Some((target, message)) if !target.contains(' ') => (target, message.trim()),
            _ => ("general", rest),
        };

        Some(Self::new(level, target, message.to_string()))
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= MAX_LOG_ENTRIES {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// Most recent `count` entries, oldest first
    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => {
                let skip = entries.len().saturating_sub(count);
                entries.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only session log file
pub struct LogFile {
    file: Mutex<Option<File>>,
    path: PathBuf,
}

impl LogFile {
    /// Opens `cx-query_<timestamp>.log` in `dir`; logging to disk is skipped if that fails
    pub fn create_in(dir: &Path) -> Self {
        let _ = std::fs::create_dir_all(dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("cx-query_{}.log", timestamp));

        #[cfg(unix)]
        {
            let latest = dir.join("latest.log");
            let _ = std::fs::remove_file(&latest);
            let _ = std::os::unix::fs::symlink(&path, &latest);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok();

        Self {
            file: Mutex::new(file),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_entry(&self, entry: &LogEntry) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = writeln!(file, "{}", entry.format_for_display());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Writer that feeds both the ring buffer and the log file
#[derive(Clone)]
pub struct DualWriter {
    buffer: LogRingBuffer,
    file: Option<Arc<LogFile>>,
}

impl DualWriter {
    pub fn new(buffer: LogRingBuffer, file: Option<Arc<LogFile>>) -> Self {
        Self { buffer, file }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for entry in text.lines().filter_map(LogEntry::parse) {
                if let Some(file) = &self.file {
                    file.write_entry(&entry);
                }
                self.buffer.push(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DualWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Handles returned by [`init_tracing`]
pub struct LoggingHandle {
    pub buffer: LogRingBuffer,
    pub log_path: Option<PathBuf>,
}

/// Initialize tracing with dual output (ring buffer + file).
///
/// Nothing is written to the terminal so logs never interleave with answers.
pub fn init_tracing(log_dir: Option<&Path>) -> LoggingHandle {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let buffer = LogRingBuffer::new();
    let file = log_dir.map(|dir| Arc::new(LogFile::create_in(dir)));
    let log_path = file.as_ref().map(|f| f.path().to_path_buf());

    let fmt_layer = fmt::layer()
        .with_writer(DualWriter::new(buffer.clone(), file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time() // We add our own timestamps
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding); keep it
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "cx_query", "Logging initialized");

    LoggingHandle { buffer, log_path }
}
