//! # Fan-out Logger
//!
//! A process-local logging sink that renders leveled text lines to several
//! byte destinations at once and fans structured records out to independent,
//! differently-paced subscribers:
//!
//! * **Destination multiplexing**: every line goes to the console, an optional
//!   primary output (file, socket, buffer) and an optional live mirror stream
//! * **Live mirror**: a pull-based [`std::io::Read`] copy of everything written,
//!   with bounded buffering and a write timeout so a stalled reader cannot hang
//!   the process
//! * **Named channels**: bounded queues of [`LogRecord`]s with drop-oldest
//!   overflow; emitting never waits on a slow subscriber
//!
//! ## Main Components
//!
//! * `Logger`: the handle carrying configuration and the emission entry points
//! * `multiplexer`: the fan-out byte sink and its target set
//! * `mirror`: the bounded pipe behind the mirror stream
//! * `channel`: the subscription registry and its overflow policy
//! * `bridge`: routes the `log` crate's macros into a `Logger`
//!
//! ## Quick Start
//!
//! ```
//! use fanout_logger::{Console, Logger, LoggerConfig};
//!
//! let logger = Logger::with_config(
//!     LoggerConfig::default()
//!         .with_product_prefix("Quickstart")
//!         .with_console(Console::Silent),
//! );
//!
//! // Persist lines to a caller-opened writer
//! logger.set_primary_output(tempfile::tempfile().unwrap());
//!
//! // Observe records live without slowing the emitter down
//! let monitor = logger.subscribe_with_capacity("monitor", 3);
//!
//! fanout_logger::info!(logger, "Hello, world!");
//! fanout_logger::warn!(logger, "Temperature: {} C", 25.5);
//!
//! assert_eq!(monitor.len(), 2);
//! logger.unsubscribe("monitor");
//! ```

pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod format;
pub mod logger;
mod macros;
pub mod mirror;
pub mod multiplexer;
pub mod record;

use lazy_static::lazy_static;

pub use channel::{ChannelRegistry, Subscription, DEFAULT_CHANNEL_CAPACITY};
pub use config::{Console, FatalAction, LoggerConfig};
pub use error::LoggerError;
pub use logger::Logger;
pub use mirror::MirrorReader;
pub use multiplexer::{Multiplexer, TargetKind};
pub use record::{Level, LogRecord};

lazy_static! {
    static ref GLOBAL: Logger = Logger::new();
}

/// Process-wide logger with the default configuration, created on first use.
///
/// Prefer passing an explicit [`Logger`] around; this exists for code that
/// wants package-level logging without threading a handle through.
///
/// ```no_run
/// fanout_logger::global().set_product_prefix("Daemon");
/// fanout_logger::info!(fanout_logger::global(), "started");
/// ```
pub fn global() -> &'static Logger {
    &GLOBAL
}
