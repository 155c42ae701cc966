//! Syslog sink: datagram pass-through to a syslog daemon
//!
//! Plumbing only. Records are framed with an RFC 3164 priority and tag and
//! handed to the daemon; severity selection happens in the logger, not here.

use parking_lot::Mutex;
use rotolog_core::{Error, Result};
use std::net::UdpSocket;
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;

use crate::severity::Severity;
use crate::sink::Sink;

/// Syslog facility codes (RFC 3164 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

enum Transport {
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixDatagram),
}

/// Sends records to a syslog daemon over UDP or the local Unix socket.
pub struct SyslogSink {
    transport: Mutex<Option<Transport>>,
    facility: Facility,
    severity: Severity,
    tag: String,
    target: String,
}

impl SyslogSink {
    /// Connect to a syslog daemon at `addr` (e.g. `"127.0.0.1:514"`) over UDP.
    pub fn udp(addr: &str, facility: Facility, severity: Severity, tag: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .and_then(|s| s.connect(addr).map(|_| s))
            .map_err(|e| Error::syslog(format!("udp {addr}: {e}")))?;
        Ok(Self {
            transport: Mutex::new(Some(Transport::Udp(socket))),
            facility,
            severity,
            tag: tag.to_string(),
            target: format!("syslog@{addr}"),
        })
    }

    /// Connect to the local syslog daemon at `/dev/log`.
    #[cfg(unix)]
    pub fn local(facility: Facility, severity: Severity, tag: &str) -> Result<Self> {
        Self::unix("/dev/log", facility, severity, tag)
    }

    /// Connect to a syslog daemon listening on a Unix datagram socket.
    #[cfg(unix)]
    pub fn unix(path: &str, facility: Facility, severity: Severity, tag: &str) -> Result<Self> {
        let socket = UnixDatagram::unbound()
            .and_then(|s| s.connect(path).map(|_| s))
            .map_err(|e| Error::syslog(format!("unix {path}: {e}")))?;
        Ok(Self {
            transport: Mutex::new(Some(Transport::Unix(socket))),
            facility,
            severity,
            tag: tag.to_string(),
            target: format!("syslog@{path}"),
        })
    }

    fn priority(&self) -> u8 {
        let sev = match self.severity {
            Severity::Emerg => 0,
            Severity::Alert => 1,
            Severity::Crit => 2,
            Severity::Err => 3,
            Severity::Warn => 4,
            Severity::Notice => 5,
            Severity::Info => 6,
            Severity::Debug => 7,
        };
        (self.facility as u8) << 3 | sev
    }
}

impl Sink for SyslogSink {
    fn write(&self, record: &[u8]) -> Result<usize> {
        let guard = self.transport.lock();
        let transport = guard
            .as_ref()
            .ok_or_else(|| Error::SinkClosed(self.target.clone()))?;

        let mut frame = format!("<{}>{}: ", self.priority(), self.tag).into_bytes();
        let header = frame.len();
        frame.extend_from_slice(record);

        let sent = match transport {
            Transport::Udp(s) => s.send(&frame)?,
            #[cfg(unix)]
            Transport::Unix(s) => s.send(&frame)?,
        };
        if sent < frame.len() {
            return Err(Error::short_write(
                self.target.as_str(),
                sent.saturating_sub(header),
                record.len(),
            ));
        }
        Ok(record.len())
    }

    fn close(&self) -> Result<()> {
        self.transport.lock().take();
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "SyslogSink"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_roundtrip() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let sink = SyslogSink::udp(
            &addr.to_string(),
            Facility::Local0,
            Severity::Info,
            "rotolog-test",
        )
        .unwrap();

        let n = sink.write(b"hello syslog").unwrap();
        assert_eq!(n, 12);

        let mut buf = [0u8; 256];
        let (len, _) = server.recv_from(&mut buf).unwrap();
        let frame = std::str::from_utf8(&buf[..len]).unwrap();
        // local0.info = 16*8 + 6
        assert!(frame.starts_with("<134>rotolog-test: "), "frame: {frame}");
        assert!(frame.ends_with("hello syslog"));
    }

    #[test]
    fn test_write_after_close() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let sink = SyslogSink::udp(
            &addr.to_string(),
            Facility::User,
            Severity::Err,
            "t",
        )
        .unwrap();

        sink.close().unwrap();
        assert!(matches!(
            sink.write(b"x"),
            Err(Error::SinkClosed(_))
        ));
    }

    #[test]
    fn test_kind() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let sink =
            SyslogSink::udp(&addr.to_string(), Facility::Daemon, Severity::Warn, "t").unwrap();
        assert_eq!(sink.kind(), "SyslogSink");
    }
}
