use std::collections::VecDeque;
use std::fmt::Write;
use std::sync::Arc;

use log::Log;
use parking_lot::Mutex;

/// A single captured log entry.
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

/// Ring buffer of captured log entries.
///
/// Capturing can be switched off without uninstalling the logger; entries
/// logged meanwhile are only forwarded to stderr.
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_capacity: usize,
    enabled: bool,
}

impl LogBuffer {
    pub fn new(max_capacity: usize, enabled: bool) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity: max_capacity.max(1),
            enabled,
        }
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    /// Appends an entry if capturing is enabled, evicting the oldest entry
    /// when full.
    pub fn push(&mut self, entry: LogEntry) {
        if !self.enabled {
            return;
        }
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Changes the capacity, dropping the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, max_capacity: usize) {
        self.max_capacity = max_capacity.max(1);
        while self.entries.len() > self.max_capacity {
            self.entries.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn has_logs(&self) -> bool {
        !self.entries.is_empty()
    }

    /// All entries, one `[LVL] target: message` line each.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "[{}] {}: {}",
                level_label(entry.level),
                entry.target,
                entry.message
            );
        }
        out
    }
}

pub fn level_label(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

/// Custom logger that wraps `env_logger` and captures entries to the ring buffer.
struct LogCapture {
    inner: env_logger::Logger,
    buffer: Arc<Mutex<LogBuffer>>,
}

impl Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            // Forward to env_logger (prints to stderr)
            self.inner.log(record);

            self.buffer.lock().push(LogEntry {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the capturing logger and returns the shared buffer.
///
/// The filter defaults to `info` and follows `RUST_LOG` when set.
pub fn install(
    capacity: usize,
    capture_on_start: bool,
) -> Result<Arc<Mutex<LogBuffer>>, log::SetLoggerError> {
    let buffer = Arc::new(Mutex::new(LogBuffer::new(capacity, capture_on_start)));

    let inner =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let max_level = inner.filter();

    let logger = LogCapture {
        inner,
        buffer: Arc::clone(&buffer),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(buffer)
}
