//! Rotolog - Structured logging with severity filtering and rotating file sinks
//!
//! A process-wide registry of named loggers, each fanning pre-formatted
//! records out to one or more sinks:
//!
//! - [`NoopSink`] — discards everything; the placeholder for new loggers
//! - [`ConsoleSink`] / [`ErrConsoleSink`] — stdout / stderr
//! - [`FileSink`] — append-mode file with size- and time-based rotation,
//!   sequence-numbered retirement and optional gzip compression
//! - [`SyslogSink`] — datagram pass-through to a syslog daemon
//!
//! ```no_run
//! use rotolog::{logger, RotationPolicy, Severity};
//!
//! let lg = logger("billing");
//! lg.add_file_sink(
//!     "/var/log/billing.log",
//!     RotationPolicy {
//!         max_size: 5 * 1024 * 1024,
//!         max_files: 3,
//!         compress: true,
//!         ..RotationPolicy::default()
//!     },
//! )?;
//! lg.log(Severity::Info, b"invoice 42 settled\n");
//! # Ok::<(), rotolog::Error>(())
//! ```

mod compress;
mod file;
mod registry;
mod severity;
mod sink;
mod syslog;

pub use file::{FileSink, RotationPolicy};
pub use registry::{logger, std_logger, Logger};
pub use severity::{Severity, SeverityFilter};
pub use sink::{ConsoleSink, ErrConsoleSink, NoopSink, Sink};
pub use syslog::{Facility, SyslogSink};

pub use rotolog_core::{Error, Result};
