//! Process-wide registry of named loggers
//!
//! One table, one lock. `logger(name)` is lookup-or-create: the first call
//! for a name creates the instance with a noop sink and an all-pass filter,
//! every later call returns the same instance.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rotolog_core::{constants, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::file::{FileSink, RotationPolicy};
use crate::severity::{Severity, SeverityFilter};
use crate::sink::{ConsoleSink, NoopSink, Sink};
use crate::syslog::{Facility, SyslogSink};

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<Logger>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Look up a logger by name, creating it on first use.
pub fn logger(name: &str) -> Arc<Logger> {
    let mut table = REGISTRY.lock();
    table
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Logger::new(name)))
        .clone()
}

/// The default `"std"` logger. A console sink is attached when it is first
/// created.
pub fn std_logger() -> Arc<Logger> {
    let lg = logger(constants::STD_LOGGER);
    lg.ensure_console();
    lg
}

/// A named logger fanning records out to its sinks.
pub struct Logger {
    name: String,
    filter: Mutex<SeverityFilter>,
    sinks: Mutex<Vec<Arc<dyn Sink>>>,
    console_attached: Mutex<bool>,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: Mutex::new(SeverityFilter::ALL),
            sinks: Mutex::new(vec![Arc::new(NoopSink) as Arc<dyn Sink>]),
            console_attached: Mutex::new(false),
        }
    }

    fn ensure_console(&self) {
        let mut attached = self.console_attached.lock();
        if !*attached {
            self.add_sink(Arc::new(ConsoleSink));
            *attached = true;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward a pre-formatted record to every sink, if `severity` passes
    /// the filter.
    ///
    /// A failing sink never stops the others; per-sink errors are reported
    /// through tracing, matching the facade's fan-out independence
    /// guarantee.
    pub fn log(&self, severity: Severity, record: &[u8]) {
        if !self.filter.lock().contains(severity) {
            return;
        }
        for sink in self.sinks.lock().iter() {
            if let Err(e) = sink.write(record) {
                warn!(
                    "logger {}: {} write failed: {}",
                    self.name,
                    sink.kind(),
                    e
                );
            }
        }
    }

    pub fn filter(&self) -> SeverityFilter {
        *self.filter.lock()
    }

    pub fn set_filter(&self, filter: SeverityFilter) {
        *self.filter.lock() = filter;
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.filter.lock().contains(severity)
    }

    /// Attach a custom sink.
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.sinks.lock().push(sink);
    }

    /// Attach a stdout sink.
    pub fn add_console_sink(&self) -> Arc<ConsoleSink> {
        let sink = Arc::new(ConsoleSink);
        self.add_sink(sink.clone());
        sink
    }

    /// Attach a rotating file sink with an explicit policy.
    pub fn add_file_sink(
        &self,
        path: impl Into<PathBuf>,
        policy: RotationPolicy,
    ) -> Result<Arc<FileSink>> {
        let sink = FileSink::create(path, policy)?;
        self.add_sink(sink.clone());
        Ok(sink)
    }

    /// Attach a rotating file sink with the default policy: 5 rotated
    /// generations of 1MB each, starting at sequence 1, compression and
    /// daily rotation disabled.
    pub fn add_std_file_sink(&self, path: impl Into<PathBuf>) -> Result<Arc<FileSink>> {
        self.add_file_sink(path, RotationPolicy::default())
    }

    /// Attach a syslog sink talking UDP to `addr`.
    pub fn add_syslog_sink(
        &self,
        addr: &str,
        facility: Facility,
        severity: Severity,
        tag: &str,
    ) -> Result<Arc<SyslogSink>> {
        let sink = Arc::new(SyslogSink::udp(addr, facility, severity, tag)?);
        self.add_sink(sink.clone());
        Ok(sink)
    }

    /// Snapshot of the attached sinks.
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.sinks.lock().clone()
    }
}
