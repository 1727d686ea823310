/// Logs at an explicit [`Level`](crate::Level).
///
/// All leveled macros take the logger first, then a format string and its
/// arguments, like `println!`. The logger may be a `Logger`, a reference, or
/// an `Arc<Logger>`.
///
/// # Examples
///
/// ```
/// # use fanout_logger::{Console, Level, Logger, LoggerConfig};
/// let logger = Logger::with_config(LoggerConfig::default().with_console(Console::Silent));
/// fanout_logger::log_at!(logger, Level::Warn, "queue depth {}", 512);
/// fanout_logger::info!(logger, "Temperature: {} C", 25.5);
/// fanout_logger::error!(logger, "Status: {}, Count: {}", false, 42);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format_args!($($arg)+))
    };
}

/// Logs at DEBUG level. Captures a stack trace.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(format_args!($($arg)+))
    };
}

/// Logs at INFO level. The only level that skips the stack trace.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(format_args!($($arg)+))
    };
}

/// Logs at WARN level. Captures a stack trace.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warn(format_args!($($arg)+))
    };
}

/// Logs at ERROR level. Captures a stack trace.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(format_args!($($arg)+))
    };
}

/// Logs at FATAL level, then performs the logger's
/// [`FatalAction`](crate::FatalAction) (by default, exits the process).
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(format_args!($($arg)+))
    };
}
