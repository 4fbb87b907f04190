use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// The two stages of a MapReduce job run by the standalone engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => f.write_str("map"),
            Phase::Reduce => f.write_str("reduce"),
        }
    }
}

/// Errors raised by the engine, the workloads and the ingestion layer.
///
/// [`Error::InvalidValue`] and [`Error::WorkerPanicked`] are recovered from
/// locally: the offending record, line or key is dropped and logged.
/// Everything else aborts the current phase and is handed back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
    #[error("{phase} phase did not finish within {timeout:?}")]
    Timeout { phase: Phase, timeout: Duration },
    #[error("{phase} phase was cancelled")]
    Cancelled { phase: Phase },
    #[error("{phase} worker panicked: {message}")]
    WorkerPanicked { phase: Phase, message: String },
    #[error("failed to spawn {phase} worker")]
    Spawn {
        phase: Phase,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error only concerns a single input and processing may go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidValue(_) | Error::WorkerPanicked { .. })
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidValue(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
