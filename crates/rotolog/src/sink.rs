//! Sink trait and the plain console/noop variants

use rotolog_core::{Error, Result};
use std::io::Write;

/// A destination for pre-formatted log records.
///
/// Sinks take the record as an opaque byte sequence; formatting and severity
/// semantics are the caller's business. Implementations must be safe to share
/// across threads — any internal state sits behind a lock.
pub trait Sink: Send + Sync {
    /// Write one record, returning the number of bytes accepted.
    ///
    /// A short write is reported as [`Error::ShortWrite`] naming the
    /// destination; it is never retried internally.
    fn write(&self, record: &[u8]) -> Result<usize>;

    /// Release any resources held by the sink.
    fn close(&self) -> Result<()>;

    /// The sink's type name, used in diagnostics.
    fn kind(&self) -> &'static str;
}

/// Issue a single write call and report a short write as an error.
///
/// Deliberately one `write`, not `write_all`: the contract is that a partial
/// write surfaces to the caller instead of being silently retried.
pub(crate) fn write_once<W: Write>(out: &mut W, record: &[u8], target: &str) -> Result<usize> {
    let n = out.write(record)?;
    if n < record.len() {
        return Err(Error::short_write(target, n, record.len()));
    }
    Ok(n)
}

/// Accepts and discards every record. Used for freshly created loggers that
/// have no sinks attached yet.
#[derive(Debug, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn write(&self, _record: &[u8]) -> Result<usize> {
        Ok(0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "NoopSink"
    }
}

/// Writes records to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn write(&self, record: &[u8]) -> Result<usize> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let n = write_once(&mut out, record, "stdout")?;
        out.flush()?;
        Ok(n)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "ConsoleSink"
    }
}

/// Writes records to stderr.
#[derive(Debug, Default)]
pub struct ErrConsoleSink;

impl Sink for ErrConsoleSink {
    fn write(&self, record: &[u8]) -> Result<usize> {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        write_once(&mut out, record, "stderr")
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "ErrConsoleSink"
    }
}
