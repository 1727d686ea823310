//! Destination multiplexer: one logical byte sink over several targets.
//!
//! The target set is the console (always present), an optional caller
//! supplied primary output, and an optional mirror pipe. Every write goes to
//! all of them, in that order.
//!
//! # Locking
//!
//! The target set lives behind a [`RwLock`]. A write holds it in shared mode
//! for its full duration, so a reconfiguration (which takes it exclusively)
//! can never land half-way through a line: writes that started before the
//! change complete against the old set, writes that start after it see the
//! new one. Inside the shared section the sinks themselves sit behind one
//! [`Mutex`], which serializes concurrent writers and gives every destination
//! the same total order of whole lines.
//!
//! A target that fails is reported and skipped; the write as a whole only
//! fails when no target accepted the bytes.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::LoggerError;
use crate::mirror::{self, MirrorReader, MirrorWriter};

/// A byte destination owned by the multiplexer.
pub type BoxedSink = Box<dyn Write + Send>;

/// Identifies one member of the target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Console,
    Primary,
    Mirror,
}

impl TargetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetKind::Console => "console",
            TargetKind::Primary => "primary",
            TargetKind::Mirror => "mirror",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Sinks {
    console: BoxedSink,
    primary: Option<BoxedSink>,
}

struct Targets {
    sinks: Mutex<Sinks>,
    mirror: Option<MirrorWriter>,
    mirror_capacity: usize,
    mirror_write_timeout: Duration,
}

/// Fan-out byte sink shared by every emitting thread.
pub struct Multiplexer {
    targets: RwLock<Targets>,
}

impl Multiplexer {
    /// Creates a multiplexer writing to `console` only.
    ///
    /// `mirror_capacity` and `mirror_write_timeout` size the pipe created by
    /// each later [`acquire_mirror`](Self::acquire_mirror).
    pub fn new(console: BoxedSink, mirror_capacity: usize, mirror_write_timeout: Duration) -> Self {
        Self {
            targets: RwLock::new(Targets {
                sinks: Mutex::new(Sinks {
                    console,
                    primary: None,
                }),
                mirror: None,
                mirror_capacity,
                mirror_write_timeout,
            }),
        }
    }

    /// Delivers `bytes` to every target in the current set.
    ///
    /// Returns [`LoggerError::AllTargetsFailed`] only if no target accepted
    /// the bytes. Each individual failure is reported through `tracing` as a
    /// [`LoggerError::DestinationWrite`].
    pub fn write(&self, bytes: &[u8]) -> Result<(), LoggerError> {
        let targets = self.targets.read();
        let mut sinks = targets.sinks.lock();
        let sinks = &mut *sinks;

        let mut attempted = 0;
        let mut failures = 0;
        let mut last_err = None;

        let mut record = |kind: TargetKind, result: io::Result<()>| {
            attempted += 1;
            if let Err(source) = result {
                let err = LoggerError::DestinationWrite { target: kind, source };
                warn!(label = err.as_label(), error = %err, "destination write failed");
                failures += 1;
                last_err = Some(io::Error::from(err));
            }
        };

        record(TargetKind::Console, write_flush(&mut sinks.console, bytes));
        if let Some(primary) = sinks.primary.as_mut() {
            record(TargetKind::Primary, write_flush(primary, bytes));
        }
        if let Some(mirror) = targets.mirror.as_ref() {
            record(TargetKind::Mirror, mirror.write_all_timeout(bytes));
        }

        match last_err {
            Some(last) if failures == attempted => Err(LoggerError::AllTargetsFailed {
                targets: attempted,
                last,
            }),
            _ => Ok(()),
        }
    }

    /// Replaces the primary output; `None` removes it.
    ///
    /// An active mirror stays attached when the primary output is removed.
    pub fn set_primary(&self, sink: Option<BoxedSink>) {
        let mut targets = self.targets.write();
        let sinks = targets.sinks.get_mut();
        if let Some(old) = sinks.primary.as_mut() {
            if let Err(err) = old.flush() {
                warn!(error = %err, "flushing replaced primary output failed");
            }
        }
        sinks.primary = sink;
        debug!(primary = sinks.primary.is_some(), "primary output reconfigured");
    }

    /// Replaces the console target.
    pub fn set_console(&self, console: BoxedSink) {
        let mut targets = self.targets.write();
        targets.sinks.get_mut().console = console;
    }

    /// Opens a new mirror stream, closing the previous one first.
    pub fn acquire_mirror(&self) -> Result<MirrorReader, LoggerError> {
        let mut targets = self.targets.write();
        if targets.sinks.get_mut().primary.is_none() {
            return Err(LoggerError::NoPrimaryOutput);
        }

        if let Some(previous) = targets.mirror.take() {
            previous.close();
            debug!("previous mirror stream closed");
        }

        let (writer, reader) = mirror::pipe(targets.mirror_capacity, targets.mirror_write_timeout);
        targets.mirror = Some(writer);
        debug!(capacity = targets.mirror_capacity, "mirror stream attached");
        Ok(reader)
    }

    /// Closes and detaches the active mirror, if any.
    pub fn release_mirror(&self) {
        let mut targets = self.targets.write();
        if let Some(mirror) = targets.mirror.take() {
            mirror.close();
            debug!("mirror stream released");
        }
    }

    /// Changes the pipe sizing used by future mirror streams.
    pub fn set_mirror_limits(&self, capacity: usize, write_timeout: Duration) {
        let mut targets = self.targets.write();
        targets.mirror_capacity = capacity;
        targets.mirror_write_timeout = write_timeout;
    }

    pub fn has_primary(&self) -> bool {
        self.targets.read().sinks.lock().primary.is_some()
    }

    pub fn has_mirror(&self) -> bool {
        self.targets.read().mirror.is_some()
    }

    /// The current target set, in write order.
    pub fn targets(&self) -> Vec<TargetKind> {
        let targets = self.targets.read();
        let mut kinds = vec![TargetKind::Console];
        if targets.sinks.lock().primary.is_some() {
            kinds.push(TargetKind::Primary);
        }
        if targets.mirror.is_some() {
            kinds.push(TargetKind::Mirror);
        }
        kinds
    }
}

impl Write for &Multiplexer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Multiplexer::write(*self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn write_flush(sink: &mut BoxedSink, bytes: &[u8]) -> io::Result<()> {
    sink.write_all(bytes)?;
    sink.flush()
}
