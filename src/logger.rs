use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::channel::{ChannelRegistry, Subscription};
use crate::config::{FatalAction, LoggerConfig};
use crate::error::LoggerError;
use crate::format;
use crate::mirror::MirrorReader;
use crate::multiplexer::{Multiplexer, TargetKind};
use crate::record::{Level, LogRecord};

/// The logging handle: emission entry points plus every destination and
/// subscription it fans out to.
///
/// A `Logger` owns three things:
///
/// 1. A [`Multiplexer`] that writes each text line to the console, an
///    optional primary output, and an optional live mirror stream
/// 2. A [`ChannelRegistry`] of named subscriptions receiving structured
///    [`LogRecord`]s, each with its own drop-oldest bounded queue
/// 3. The configuration read on every emission (product prefix, default
///    channel capacity, what FATAL does)
///
/// # Thread Safety
///
/// `Logger` is `Send + Sync`. Share it between threads with an `Arc` (or use
/// [`global`](crate::global)); all methods take `&self`. Channel delivery
/// never blocks the caller. Writing the text line may block while a mirror
/// reader is not draining, bounded by the configured mirror write timeout.
///
/// # Timestamps
///
/// Lines carry local time. The local offset is resolved once, when the first
/// logger is built. Where the platform refuses to read it with other threads
/// running, lines fall back to UTC, so build the logger (or call
/// [`format::init_local_offset`]) before spawning threads.
///
/// # Examples
///
/// ```
/// use fanout_logger::{Console, Logger, LoggerConfig};
///
/// let logger = Logger::with_config(LoggerConfig::default().with_console(Console::Silent));
/// logger.set_product_prefix("Inventory");
///
/// let alerts = logger.subscribe("alerts");
/// fanout_logger::info!(logger, "restocked {} items", 12);
///
/// let record = alerts.try_recv().unwrap();
/// assert_eq!(record.message(), "restocked 12 items");
/// assert_eq!(record.prefix(), "Inventory");
/// ```
pub struct Logger {
    prefix: RwLock<String>,
    mux: Multiplexer,
    channels: ChannelRegistry,
    fatal_action: FatalAction,
    terminated: AtomicBool,
}

impl Logger {
    /// Creates a logger with the default configuration, printing to stdout.
    pub fn new() -> Self {
        Self::with_config(LoggerConfig::default())
    }

    /// Creates a logger from `config`.
    pub fn with_config(config: LoggerConfig) -> Self {
        let console = config.console.into_sink();
        Self::build(config, console)
    }

    /// Creates a logger whose console target is `console` instead of the one
    /// selected by `config.console`.
    ///
    /// Useful to capture exactly what the console would have shown.
    pub fn with_console(config: LoggerConfig, console: impl Write + Send + 'static) -> Self {
        Self::build(config, Box::new(console))
    }

    fn build(config: LoggerConfig, console: Box<dyn Write + Send>) -> Self {
        format::init_local_offset();
        Self {
            prefix: RwLock::new(config.product_prefix),
            mux: Multiplexer::new(console, config.mirror_capacity, config.mirror_write_timeout),
            channels: ChannelRegistry::new(config.channel_capacity),
            fatal_action: config.fatal_action,
            terminated: AtomicBool::new(false),
        }
    }

    /// Sets the product name written at the start of every line and carried
    /// by every record.
    pub fn set_product_prefix(&self, name: impl Into<String>) {
        *self.prefix.write() = name.into();
    }

    pub fn product_prefix(&self) -> String {
        self.prefix.read().clone()
    }

    /// Sets the primary output, replacing any previous one.
    ///
    /// The logger takes ownership of an already-open writer (a file, a
    /// socket, an in-memory buffer) and writes each line to it after the
    /// console. Opening and closing the underlying resource is the caller's
    /// business; the previous writer is flushed and dropped here.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fanout_logger::{Console, Logger, LoggerConfig};
    /// let logger = Logger::with_config(LoggerConfig::default().with_console(Console::Silent));
    /// let file = tempfile::tempfile().unwrap();
    /// logger.set_primary_output(file);
    /// fanout_logger::info!(logger, "persisted");
    /// ```
    pub fn set_primary_output(&self, sink: impl Write + Send + 'static) {
        self.mux.set_primary(Some(Box::new(sink)));
    }

    /// Removes the primary output. Lines keep going to the console, and to
    /// the mirror if one is still attached.
    pub fn remove_primary_output(&self) {
        self.mux.set_primary(None);
    }

    pub fn has_primary_output(&self) -> bool {
        self.mux.has_primary()
    }

    /// Returns a live stream of every line written from now on.
    ///
    /// Only one mirror exists at a time: acquiring again closes the previous
    /// stream, whose reader then drains what it already holds and sees
    /// end-of-stream.
    ///
    /// The mirror buffers a bounded number of bytes. A reader that stops
    /// draining makes each write wait up to the mirror write timeout, after
    /// which the mirror alone misses (part of) that line. Keep a consumer
    /// reading for as long as the mirror is held; consumers that cannot keep
    /// up should [`subscribe`](Self::subscribe) instead.
    ///
    /// # Errors
    ///
    /// [`LoggerError::NoPrimaryOutput`] if no primary output is set.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fanout_logger::{Console, Logger, LoggerConfig};
    /// use std::io::{BufRead, BufReader};
    ///
    /// let logger = Logger::with_config(LoggerConfig::default().with_console(Console::Silent));
    /// assert!(logger.acquire_mirror().is_err());
    ///
    /// logger.set_primary_output(std::io::sink());
    /// let mirror = logger.acquire_mirror().unwrap();
    /// fanout_logger::info!(logger, "watch me");
    /// logger.release_mirror();
    ///
    /// let lines: Vec<String> = BufReader::new(mirror).lines().map(|l| l.unwrap()).collect();
    /// assert!(lines[0].ends_with("[INFO] watch me"));
    /// ```
    pub fn acquire_mirror(&self) -> Result<MirrorReader, LoggerError> {
        self.mux.acquire_mirror()
    }

    /// Closes and detaches the mirror stream. Does nothing if none is active.
    pub fn release_mirror(&self) {
        self.mux.release_mirror();
    }

    pub fn has_mirror(&self) -> bool {
        self.mux.has_mirror()
    }

    /// The current destination set, in write order.
    pub fn targets(&self) -> Vec<TargetKind> {
        self.mux.targets()
    }

    /// Sets the capacity of channels later subscribed without one.
    ///
    /// Zero restores the built-in default. Existing channels keep theirs.
    pub fn set_default_channel_capacity(&self, capacity: usize) {
        self.channels.set_default_capacity(capacity);
    }

    pub fn default_channel_capacity(&self) -> usize {
        self.channels.default_capacity()
    }

    /// Returns the channel `name`, creating it with the default capacity.
    ///
    /// See [`subscribe_with_capacity`](Self::subscribe_with_capacity).
    pub fn subscribe(&self, name: &str) -> Subscription {
        self.channels.subscribe(name)
    }

    /// Returns the channel `name`, creating it with `capacity` if it does
    /// not exist yet.
    ///
    /// Every emission after this call is offered to the channel. When the
    /// channel is full the oldest buffered record is evicted, so a consumer
    /// that falls behind reads the latest `capacity` records in order.
    /// Subscribing to an existing name returns a handle on the same queue and
    /// ignores `capacity`.
    pub fn subscribe_with_capacity(&self, name: &str, capacity: usize) -> Subscription {
        self.channels.subscribe_with_capacity(name, capacity)
    }

    /// Removes the channel `name` and discards what it still buffers.
    /// Receivers blocked on it wake up with end-of-stream. Unknown names are
    /// ignored.
    pub fn unsubscribe(&self, name: &str) {
        self.channels.unsubscribe(name);
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.names()
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Emits a FATAL record, then performs the configured [`FatalAction`].
    ///
    /// With the default `FatalAction::Exit(1)` this never returns. With
    /// `FatalAction::Halt` it returns and the logger is terminated: every
    /// later emission is ignored.
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Fatal, args);
    }

    /// Runs the emission pipeline for one call.
    ///
    /// 1. Renders the message and builds the [`LogRecord`] with the current
    ///    prefix (capturing a stack trace unless `level` is INFO)
    /// 2. Offers the record to every channel without waiting
    /// 3. Writes the text line, stack trace included, through the multiplexer
    /// 4. For FATAL, performs the terminal action
    ///
    /// Destination failures are reported through `tracing` and never reach
    /// the caller.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level == Level::Fatal {
            if self.terminated.swap(true, Ordering::AcqRel) {
                return;
            }
        } else if self.terminated.load(Ordering::Acquire) {
            return;
        }

        let record = LogRecord::new(level, fmt::format(args), self.product_prefix());
        let line = record.to_line();

        self.channels.broadcast(record);

        if let Err(err) = self.mux.write(&line) {
            tracing::warn!(label = err.as_label(), error = %err, "log line reached no destination");
        }

        if level == Level::Fatal {
            self.terminate();
        }
    }

    /// Whether a FATAL emission has already happened.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Direct access to the destination multiplexer, e.g. to write raw
    /// bytes through `impl Write for &Multiplexer`.
    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    fn terminate(&self) {
        match self.fatal_action {
            FatalAction::Exit(code) => {
                tracing::debug!(code, "fatal record written, exiting");
                std::process::exit(code);
            }
            FatalAction::Halt => {
                tracing::debug!("fatal record written, logger halted");
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("prefix", &*self.prefix.read())
            .field("targets", &self.mux.targets())
            .field("channels", &self.channels.names())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
