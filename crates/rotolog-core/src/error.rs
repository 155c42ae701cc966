//! Error types for rotolog

use std::path::PathBuf;

/// Rotolog error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying writer accepted fewer bytes than submitted.
    /// Not retried internally; callers decide whether to retry or drop.
    #[error("short write to {target}: wrote {written} of {expected} bytes")]
    ShortWrite {
        target: String,
        written: usize,
        expected: usize,
    },

    /// Renaming the live file to its retirement name failed.
    /// The sink is degraded: its active handle is closed.
    #[error("failed to retire {from} to {to}: {source}")]
    RotateRename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Reopening the live path after rotation failed; the sink has no
    /// usable handle.
    #[error("failed to reopen log file {path}: {source}")]
    RotateOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Write or close attempted on a sink that has been closed.
    #[error("sink is closed: {0}")]
    SinkClosed(String),

    #[error("syslog connection failed: {0}")]
    SyslogConnect(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rotolog
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn short_write(target: impl Into<String>, written: usize, expected: usize) -> Self {
        Error::ShortWrite {
            target: target.into(),
            written,
            expected,
        }
    }

    pub fn syslog<S: Into<String>>(msg: S) -> Self {
        Error::SyslogConnect(msg.into())
    }
}
