//! Error types surfaced by the logger.
//!
//! Almost every failure in the emission path is contained where it happens: a
//! destination that refuses bytes is reported as [`LoggerError::DestinationWrite`]
//! and skipped, and a subscription that cannot take a record simply loses it.
//! The only error a caller has to handle is asking for a mirror stream before
//! a primary output exists.

use std::io;
use thiserror::Error;

use crate::multiplexer::TargetKind;

/// Errors produced by the logger's configuration and write paths.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoggerError {
    /// A mirror stream was requested but no primary output has been set.
    ///
    /// The mirror is an auxiliary view of the primary output's data flow, so
    /// [`Logger::set_primary_output`](crate::Logger::set_primary_output) must
    /// be called first.
    #[error("no primary output set, call set_primary_output first")]
    NoPrimaryOutput,

    /// One destination rejected a write. The other destinations still got it.
    #[error("{target} destination write failed: {source}")]
    DestinationWrite {
        target: TargetKind,
        #[source]
        source: io::Error,
    },

    /// Every configured destination rejected a write.
    #[error("all {targets} destinations failed, last error: {last}")]
    AllTargetsFailed {
        /// Number of destinations the write was attempted on.
        targets: usize,
        /// The error returned by the last destination tried.
        last: io::Error,
    },
}

impl LoggerError {
    /// Returns a short stable label (snake_case) for use in diagnostics.
    ///
    /// # Example
    /// ```
    /// use fanout_logger::LoggerError;
    ///
    /// assert_eq!(LoggerError::NoPrimaryOutput.as_label(), "no_primary_output");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoggerError::NoPrimaryOutput => "no_primary_output",
            LoggerError::DestinationWrite { .. } => "destination_write",
            LoggerError::AllTargetsFailed { .. } => "all_targets_failed",
        }
    }
}

impl From<LoggerError> for io::Error {
    fn from(err: LoggerError) -> Self {
        match err {
            LoggerError::DestinationWrite { source, .. } => source,
            LoggerError::AllTargetsFailed { last, .. } => last,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let all = LoggerError::AllTargetsFailed {
            targets: 2,
            last: io::Error::new(io::ErrorKind::BrokenPipe, "gone"),
        };
        assert_eq!(all.as_label(), "all_targets_failed");
        assert!(all.to_string().contains("all 2 destinations failed"));
    }

    #[test]
    fn test_destination_write_names_target_and_keeps_source() {
        use std::error::Error as _;

        let err = LoggerError::DestinationWrite {
            target: TargetKind::Mirror,
            source: io::Error::new(io::ErrorKind::TimedOut, "reader stalled"),
        };
        assert_eq!(err.as_label(), "destination_write");
        assert_eq!(err.to_string(), "mirror destination write failed: reader stalled");
        assert!(err.source().is_some());

        let err: io::Error = err.into();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_into_io_error_keeps_last_kind() {
        let err: io::Error = LoggerError::AllTargetsFailed {
            targets: 1,
            last: io::Error::new(io::ErrorKind::TimedOut, "slow"),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        let err: io::Error = LoggerError::NoPrimaryOutput.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
