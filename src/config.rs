//! Logger configuration.
//!
//! [`LoggerConfig`] is a plain value: start from [`Default`] and override what
//! you need, either through the public fields or the `with_*` helpers.
//!
//! ```
//! use std::time::Duration;
//! use fanout_logger::{Console, FatalAction, Logger, LoggerConfig};
//!
//! let cfg = LoggerConfig::default()
//!     .with_product_prefix("Billing")
//!     .with_channel_capacity(16)
//!     .with_mirror_write_timeout(Duration::from_millis(250))
//!     .with_console(Console::Silent)
//!     .with_fatal_action(FatalAction::Halt);
//!
//! let logger = Logger::with_config(cfg);
//! assert_eq!(logger.product_prefix(), "Billing");
//! assert_eq!(logger.default_channel_capacity(), 16);
//! ```

use std::io;
use std::time::Duration;

use crate::channel::DEFAULT_CHANNEL_CAPACITY;
use crate::multiplexer::BoxedSink;

/// Default number of bytes a mirror pipe buffers before the writer waits.
pub const DEFAULT_MIRROR_CAPACITY: usize = 64 * 1024;

/// Default time a write waits on a mirror reader that is not draining.
pub const DEFAULT_MIRROR_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Where the always-present console target writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Console {
    #[default]
    Stdout,
    Stderr,
    /// Discard console output; the console target stays in the set.
    Silent,
}

impl Console {
    pub(crate) fn into_sink(self) -> BoxedSink {
        match self {
            Console::Stdout => Box::new(io::stdout()),
            Console::Stderr => Box::new(io::stderr()),
            Console::Silent => Box::new(io::sink()),
        }
    }
}

/// What a FATAL emission does once its line has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalAction {
    /// Exit the process with the given status code.
    Exit(i32),
    /// Mark the logger terminated and return to the caller.
    ///
    /// Every later emission on the logger is ignored.
    Halt,
}

impl Default for FatalAction {
    fn default() -> Self {
        FatalAction::Exit(1)
    }
}

/// Construction-time settings for a [`Logger`](crate::Logger).
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Product name written between brackets at the start of each line.
    pub product_prefix: String,
    /// Capacity of channels subscribed without an explicit one.
    pub channel_capacity: usize,
    /// Bytes buffered by each mirror pipe.
    pub mirror_capacity: usize,
    /// Longest time a write waits for the mirror reader to make room.
    pub mirror_write_timeout: Duration,
    pub console: Console,
    pub fatal_action: FatalAction,
}

impl Default for LoggerConfig {
    /// Provides a default configuration:
    /// - `product_prefix = ""`
    /// - `channel_capacity = 100`
    /// - `mirror_capacity = 64 KiB`
    /// - `mirror_write_timeout = 1s`
    /// - `console = Console::Stdout`
    /// - `fatal_action = FatalAction::Exit(1)`
    fn default() -> Self {
        Self {
            product_prefix: String::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            mirror_capacity: DEFAULT_MIRROR_CAPACITY,
            mirror_write_timeout: DEFAULT_MIRROR_WRITE_TIMEOUT,
            console: Console::default(),
            fatal_action: FatalAction::default(),
        }
    }
}

impl LoggerConfig {
    pub fn with_product_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.product_prefix = prefix.into();
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_mirror_capacity(mut self, bytes: usize) -> Self {
        self.mirror_capacity = bytes;
        self
    }

    pub fn with_mirror_write_timeout(mut self, timeout: Duration) -> Self {
        self.mirror_write_timeout = timeout;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn with_fatal_action(mut self, action: FatalAction) -> Self {
        self.fatal_action = action;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.product_prefix, "");
        assert_eq!(cfg.channel_capacity, 100);
        assert_eq!(cfg.mirror_capacity, 64 * 1024);
        assert_eq!(cfg.mirror_write_timeout, Duration::from_secs(1));
        assert_eq!(cfg.console, Console::Stdout);
        assert_eq!(cfg.fatal_action, FatalAction::Exit(1));
    }
}
