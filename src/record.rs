//! Structured log records handed to channel subscribers.

use std::backtrace::Backtrace;
use std::fmt;
use std::thread;

use time::OffsetDateTime;

use crate::format;

/// Severity of a log record.
///
/// Levels are ordered from least to most severe, so `Level::Warn > Level::Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// The tag written between brackets in a text line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Whether records at this level carry a stack trace.
    ///
    /// INFO is the high-volume path and never pays for a capture.
    pub const fn captures_stack(self) -> bool {
        !matches!(self, Level::Info)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted log event.
///
/// Records are immutable once built. Subscribers receive them behind an
/// `Arc`, so every channel shares the same allocation.
#[derive(Debug, Clone)]
pub struct LogRecord {
    timestamp: OffsetDateTime,
    level: Level,
    message: String,
    prefix: String,
    stack_trace: Vec<u8>,
}

impl LogRecord {
    /// Builds a record stamped with the current local time.
    ///
    /// A single trailing newline is stripped from `message`. The stack trace is
    /// captured here for every level except [`Level::Info`].
    pub fn new(level: Level, message: impl Into<String>, prefix: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.ends_with('\n') {
            message.pop();
        }

        let stack_trace = if level.captures_stack() {
            capture_stack()
        } else {
            Vec::new()
        };

        Self {
            timestamp: format::now(),
            level,
            message,
            prefix: prefix.into(),
            stack_trace,
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The rendered message, without a trailing newline.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The product prefix configured when the record was emitted.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Raw stack trace text; empty for INFO records.
    pub fn stack_trace(&self) -> &[u8] {
        &self.stack_trace
    }

    /// Renders the record as the text line written to destinations.
    pub fn to_line(&self) -> Vec<u8> {
        format::render_line(
            &self.prefix,
            self.timestamp,
            self.level,
            &self.message,
            &self.stack_trace,
        )
    }
}

/// Captures the calling thread's stack, headed by the thread name.
fn capture_stack() -> Vec<u8> {
    let current = thread::current();
    let name = current.name().unwrap_or("<unnamed>");
    let mut trace = format!("thread '{}' [running]:\n{}", name, Backtrace::force_capture());
    if !trace.ends_with('\n') {
        trace.push('\n');
    }
    trace.into_bytes()
}
