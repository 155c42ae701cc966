//! Syslog-style severity levels and the per-logger filter bitmask

use std::fmt;

/// Log severity, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Emerg,
    Alert,
    Crit,
    Err,
    Warn,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Bit assigned to this severity in a [`SeverityFilter`].
    pub const fn bit(self) -> u8 {
        match self {
            Severity::Emerg => 1 << 0,
            Severity::Alert => 1 << 1,
            Severity::Crit => 1 << 2,
            Severity::Err => 1 << 3,
            Severity::Warn => 1 << 4,
            Severity::Notice => 1 << 5,
            Severity::Info => 1 << 6,
            Severity::Debug => 1 << 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Emerg => "emerg",
            Severity::Alert => "alert",
            Severity::Crit => "crit",
            Severity::Err => "err",
            Severity::Warn => "warn",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask selecting which severities a logger forwards to its sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityFilter(u8);

impl SeverityFilter {
    /// Passes every severity.
    pub const ALL: SeverityFilter = SeverityFilter(0xff);

    /// Passes nothing.
    pub const NONE: SeverityFilter = SeverityFilter(0);

    /// Build a filter from an explicit set of severities.
    pub fn from_severities(severities: &[Severity]) -> Self {
        let mut mask = 0;
        for s in severities {
            mask |= s.bit();
        }
        SeverityFilter(mask)
    }

    pub const fn contains(self, severity: Severity) -> bool {
        self.0 & severity.bit() != 0
    }

    #[must_use]
    pub const fn with(self, severity: Severity) -> Self {
        SeverityFilter(self.0 | severity.bit())
    }

    #[must_use]
    pub const fn without(self, severity: Severity) -> Self {
        SeverityFilter(self.0 & !severity.bit())
    }
}

impl Default for SeverityFilter {
    fn default() -> Self {
        SeverityFilter::ALL
    }
}
