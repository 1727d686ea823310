//! Adapter routing the `log` crate's macros into a [`Logger`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use fanout_logger::{bridge, Logger};
//!
//! let logger = Arc::new(Logger::new());
//! bridge::install_log_bridge(Arc::clone(&logger), log::LevelFilter::Info).unwrap();
//! log::info!("now flowing through the fan-out logger");
//! ```

use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::logger::Logger;
use crate::record::Level;

/// `log::Log` implementation forwarding every record to a [`Logger`].
///
/// `log` has no FATAL level, so a bridged call never terminates the process.
/// TRACE is folded into DEBUG.
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        !self.logger.is_terminated()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.logger.log(map_level(record.level()), *record.args());
    }

    fn flush(&self) {}
}

/// Installs a [`LogBridge`] as the global `log` backend.
///
/// Fails if another `log` backend was installed first.
pub fn install_log_bridge(logger: Arc<Logger>, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(max_level);
    Ok(())
}

fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}
