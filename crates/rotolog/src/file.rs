//! Rotating file sink
//!
//! Owns one active append-mode handle and rotates it on a size threshold or
//! a daily timer, retiring the old file under a sequence-numbered name with
//! optional gzip compression of the retired segment.

use chrono::{DateTime, Local, TimeZone};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rotolog_core::{constants, Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

use crate::compress::spawn_compress;
use crate::sink::{write_once, Sink};

/// Rotation policy for a [`FileSink`].
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Byte threshold that triggers size-based rotation; 0 disables the
    /// size trigger.
    pub max_size: u64,
    /// Number of retained rotated generations before sequence numbers wrap;
    /// 0 disables rotation entirely and the live file grows unbounded.
    pub max_files: u32,
    /// Sequence number assigned to the first retired file.
    pub start_seq: u32,
    /// Gzip retired files on a detached task.
    pub compress: bool,
    /// Rotate at local midnight from a background timer. While enabled, the
    /// size trigger is suppressed so two independent causes never rotate in
    /// rapid succession.
    pub daily: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: constants::DEFAULT_MAX_SIZE,
            max_files: constants::DEFAULT_MAX_FILES,
            start_seq: constants::DEFAULT_START_SEQ,
            compress: false,
            daily: false,
        }
    }
}

struct Inner {
    out: Option<File>,
    written: u64,
    max_size: u64,
    max_files: u32,
    seq: u32,
    compress: bool,
    daily: bool,
    closed: bool,
    stop_tx: Option<Sender<()>>,
}

/// Sink that writes to a file and rotates it when necessary.
///
/// All mutable state sits behind one mutex: concurrent writers serialize on
/// the write-then-maybe-rotate sequence, so no caller ever observes a handle
/// mid-rotation and the byte counter never loses an update.
pub struct FileSink {
    path: PathBuf,
    inner: Mutex<Inner>,
    // handed to the daily timer thread so a dropped sink ends the loop
    weak: Weak<FileSink>,
}

impl FileSink {
    /// Open a rotating file sink at `path`.
    ///
    /// Probes `path.N` (or `path.N.gz` when compressing) upward from the
    /// configured start sequence until a free name is found, so a retired
    /// file left over from a previous run is never clobbered. The initial
    /// rotation then establishes the active handle; if `path` itself already
    /// exists it is retired immediately.
    pub fn create(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Arc<Self>> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let start = policy.start_seq.max(1);
        let seq = if policy.max_files > 0 {
            find_free_sequence(&path, start, policy.compress)
        } else {
            start
        };

        let mut inner = Inner {
            out: None,
            written: 0,
            max_size: policy.max_size,
            max_files: policy.max_files,
            seq,
            compress: policy.compress,
            daily: false,
            closed: false,
            stop_tx: None,
        };
        rotate_locked(&path, &mut inner)?;

        let sink = Arc::new_cyclic(|weak| Self {
            path,
            inner: Mutex::new(inner),
            weak: weak.clone(),
        });
        if policy.daily {
            sink.set_daily(true);
        }
        Ok(sink)
    }

    /// Open a sink with the default policy: 5 rotated generations of 1MB
    /// each, no compression, no daily rotation.
    pub fn create_std(path: impl Into<PathBuf>) -> Result<Arc<Self>> {
        Self::create(path, RotationPolicy::default())
    }

    /// The live log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the active file since the last rotation.
    pub fn written(&self) -> u64 {
        self.inner.lock().written
    }

    /// Max file size before size-based rotation.
    pub fn size(&self) -> u64 {
        self.inner.lock().max_size
    }

    pub fn set_size(&self, max_size: u64) {
        self.inner.lock().max_size = max_size;
    }

    /// Number of rotated generations kept.
    pub fn rotate_count(&self) -> u32 {
        self.inner.lock().max_files
    }

    pub fn set_rotate_count(&self, max_files: u32) {
        self.inner.lock().max_files = max_files;
    }

    /// Whether retired files are gzip-compressed.
    pub fn compress(&self) -> bool {
        self.inner.lock().compress
    }

    pub fn set_compress(&self, compress: bool) {
        self.inner.lock().compress = compress;
    }

    /// Sequence number the next retired file will receive.
    pub fn seq(&self) -> u32 {
        self.inner.lock().seq
    }

    pub fn set_seq(&self, seq: u32) {
        self.inner.lock().seq = seq.max(1);
    }

    /// Whether the daily midnight timer is active.
    pub fn daily(&self) -> bool {
        self.inner.lock().daily
    }

    /// Enable or disable daily rotation.
    ///
    /// The background timer is spawned only on the off-to-on transition.
    /// Disabling signals the timer thread through its stop channel, so it
    /// exits before the next midnight; an in-flight rotation still completes.
    pub fn set_daily(&self, daily: bool) {
        let mut inner = self.inner.lock();
        if daily && !inner.daily && !inner.closed {
            let (tx, rx) = crossbeam_channel::bounded(1);
            let weak = self.weak.clone();
            let spawned = std::thread::Builder::new()
                .name("rotolog-daily".into())
                .spawn(move || daily_loop(weak, rx));
            match spawned {
                Ok(_) => inner.stop_tx = Some(tx),
                Err(e) => {
                    warn!("failed to spawn daily rotation thread: {}", e);
                    return;
                }
            }
        } else if !daily && inner.daily {
            // dropping the sender disconnects the timer's stop channel
            inner.stop_tx.take();
        }
        inner.daily = daily;
    }
}

impl Sink for FileSink {
    /// Write one record and rotate the file if the size threshold is crossed.
    ///
    /// A short write surfaces as [`Error::ShortWrite`] naming the live path.
    /// An error from the inline rotation is returned to this caller; the
    /// record itself has already been persisted at that point.
    fn write(&self, record: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        let target = self.path.display().to_string();
        if inner.closed {
            return Err(Error::SinkClosed(target));
        }
        let out = inner
            .out
            .as_mut()
            .ok_or_else(|| Error::SinkClosed(target.clone()))?;

        let n = write_once(out, record, &target)?;

        inner.written += n as u64;
        if !inner.daily && inner.max_files > 0 && inner.max_size > 0 && inner.written >= inner.max_size
        {
            rotate_locked(&self.path, &mut inner)?;
        }
        Ok(n)
    }

    /// Close the active handle exactly once, stopping the daily timer.
    /// Later calls return `Ok` without touching the file again.
    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.stop_tx.take();
        inner.daily = false;
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;
        if let Some(out) = inner.out.take() {
            out.sync_all()?;
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "FileSink"
    }
}

/// Retire the live file and reopen a fresh active handle. Called with the
/// sink's lock held.
fn rotate_locked(path: &Path, inner: &mut Inner) -> Result<()> {
    // closing the retiring handle; close errors are ignored, the file is
    // not relied upon further
    inner.out.take();

    if inner.max_files > 0 {
        if inner.seq > inner.max_files {
            inner.seq = 1;
        }
        let retired = numbered(path, inner.seq);
        match fs::rename(path, &retired) {
            Ok(()) => {
                inner.seq += 1;
                if inner.seq > inner.max_files {
                    inner.seq = 1;
                }
                if inner.compress && retired.exists() {
                    spawn_compress(retired);
                }
            }
            // nothing at the live path yet, nothing to retire
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::RotateRename {
                    from: path.to_path_buf(),
                    to: retired,
                    source: e,
                })
            }
        }
    }

    let file = open_active(path)
        .or_else(|e| {
            debug!("reopening {} failed ({}), retrying once", path.display(), e);
            open_active(path)
        })
        .map_err(|e| Error::RotateOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
    inner.out = Some(file);
    inner.written = 0;
    Ok(())
}

fn open_active(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(constants::LOG_FILE_MODE);
    }
    opts.open(path)
}

/// `<path>.<seq>`
fn numbered(path: &Path, seq: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{seq}"));
    PathBuf::from(name)
}

/// First sequence number whose retirement name is free on disk.
fn find_free_sequence(path: &Path, start: u32, compress: bool) -> u32 {
    let mut seq = start;
    loop {
        let mut candidate = numbered(path, seq);
        if compress {
            let mut name = candidate.into_os_string();
            name.push(format!(".{}", constants::GZ_SUFFIX));
            candidate = PathBuf::from(name);
        }
        if !candidate.exists() {
            return seq;
        }
        seq += 1;
    }
}

/// Timer loop for daily rotation. Exits on a stop message, a disconnected
/// stop channel, a dropped sink, or observing the flag cleared after a fire.
fn daily_loop(sink: Weak<FileSink>, stop: Receiver<()>) {
    loop {
        let wait = until_next_midnight(Local::now());
        match stop.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let Some(sink) = sink.upgrade() else { break };
                let mut inner = sink.inner.lock();
                if let Err(e) = rotate_locked(&sink.path, &mut inner) {
                    warn!("daily rotation of {} failed: {}", sink.path.display(), e);
                }
                // reset regardless of the rotation outcome
                inner.written = 0;
                if !inner.daily {
                    break;
                }
            }
        }
    }
}

/// Duration from `now` to the next local midnight.
fn until_next_midnight(now: DateTime<Local>) -> Duration {
    let fallback = Duration::from_secs(24 * 3600);
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return fallback;
    };
    let Some(midnight) = tomorrow.and_hms_opt(0, 0, 0) else {
        return fallback;
    };
    // a DST transition can make local midnight ambiguous or skipped
    match Local.from_local_datetime(&midnight).earliest() {
        Some(m) => (m - now).to_std().unwrap_or(Duration::from_secs(1)),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn policy(max_size: u64, max_files: u32) -> RotationPolicy {
        RotationPolicy {
            max_size,
            max_files,
            start_seq: 1,
            compress: false,
            daily: false,
        }
    }

    #[test]
    fn test_create_opens_live_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create_std(&path).unwrap();
        assert!(path.exists());
        assert_eq!(sink.written(), 0);
        assert_eq!(sink.kind(), "FileSink");
    }

    #[test]
    fn test_write_appends_and_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create_std(&path).unwrap();

        assert_eq!(sink.write(b"hello\n").unwrap(), 6);
        assert_eq!(sink.write(b"world\n").unwrap(), 6);
        assert_eq!(sink.written(), 12);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
    }

    #[test]
    fn test_size_rotation_trigger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(&path, policy(10, 3)).unwrap();

        // crosses the threshold in one write: rotates before returning
        sink.write(b"0123456789ab").unwrap();
        assert_eq!(sink.written(), 0);
        assert!(numbered(&path, 1).exists());
        assert_eq!(fs::read_to_string(numbered(&path, 1)).unwrap(), "0123456789ab");
        // live file reopened empty
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_threshold_reached_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(&path, policy(10, 3)).unwrap();

        sink.write(b"0123456789").unwrap();
        assert!(numbered(&path, 1).exists());
        assert_eq!(sink.written(), 0);
    }

    #[test]
    fn test_sequence_wraparound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(&path, policy(4, 3)).unwrap();

        // four rotations: retirements land in .1 .2 .3 then wrap to .1
        sink.write(b"aaaa").unwrap();
        sink.write(b"bbbb").unwrap();
        sink.write(b"cccc").unwrap();
        sink.write(b"dddd").unwrap();

        assert_eq!(fs::read_to_string(numbered(&path, 2)).unwrap(), "bbbb");
        assert_eq!(fs::read_to_string(numbered(&path, 3)).unwrap(), "cccc");
        // fourth rotation wrapped and overwrote .1
        assert_eq!(fs::read_to_string(numbered(&path, 1)).unwrap(), "dddd");
        assert!(!numbered(&path, 4).exists());
    }

    #[test]
    fn test_rotation_disabled_grows_unbounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(&path, policy(8, 0)).unwrap();

        for _ in 0..50 {
            sink.write(b"0123456789").unwrap();
        }
        assert_eq!(fs::metadata(&path).unwrap().len(), 500);
        assert_eq!(sink.written(), 500);
        assert!(!numbered(&path, 1).exists());
    }

    #[test]
    fn test_size_trigger_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(&path, policy(0, 3)).unwrap();

        for _ in 0..50 {
            sink.write(b"0123456789").unwrap();
        }
        assert!(!numbered(&path, 1).exists());
    }

    #[test]
    fn test_no_clobber_on_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(numbered(&path, 1), b"previous run").unwrap();

        let sink = FileSink::create(&path, policy(4, 5)).unwrap();
        assert_eq!(sink.seq(), 2);

        sink.write(b"aaaa").unwrap();
        assert_eq!(fs::read_to_string(numbered(&path, 1)).unwrap(), "previous run");
        assert_eq!(fs::read_to_string(numbered(&path, 2)).unwrap(), "aaaa");
    }

    #[test]
    fn test_startup_retires_existing_live_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"stale").unwrap();

        let sink = FileSink::create(&path, policy(1024, 5)).unwrap();
        assert_eq!(fs::read_to_string(numbered(&path, 1)).unwrap(), "stale");
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        drop(sink);
    }

    #[test]
    fn test_close_exactly_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create_std(&path).unwrap();

        sink.write(b"x").unwrap();
        assert!(sink.close().is_ok());
        assert!(sink.close().is_ok());
        assert!(matches!(sink.write(b"y"), Err(Error::SinkClosed(_))));
    }

    #[test]
    fn test_policy_accessors() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::create_std(dir.path().join("app.log")).unwrap();

        sink.set_size(42);
        assert_eq!(sink.size(), 42);
        sink.set_rotate_count(7);
        assert_eq!(sink.rotate_count(), 7);
        sink.set_compress(true);
        assert!(sink.compress());
        sink.set_seq(3);
        assert_eq!(sink.seq(), 3);
        sink.set_seq(0);
        assert_eq!(sink.seq(), 1);
    }

    #[test]
    fn test_daily_suppresses_size_trigger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::create(
            &path,
            RotationPolicy {
                max_size: 4,
                max_files: 3,
                start_seq: 1,
                compress: false,
                daily: true,
            },
        )
        .unwrap();

        sink.write(b"0123456789").unwrap();
        assert!(!numbered(&path, 1).exists());
        assert_eq!(sink.written(), 10);
        sink.set_daily(false);
    }

    #[test]
    fn test_daily_toggle() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::create_std(dir.path().join("app.log")).unwrap();

        assert!(!sink.daily());
        sink.set_daily(true);
        assert!(sink.daily());
        sink.set_daily(false);
        assert!(!sink.daily());
        // toggling off twice is harmless
        sink.set_daily(false);
    }

    #[test]
    fn test_mode_0640() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("app.log");
            let _sink = FileSink::create_std(&path).unwrap();
            let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            // umask may clear bits but never adds them
            assert_eq!(mode & !0o640, 0);
        }
    }

    #[test]
    fn test_until_next_midnight_bounds() {
        let now = Local::now();
        let d = until_next_midnight(now);
        assert!(d <= Duration::from_secs(25 * 3600));
        assert!(d > Duration::ZERO);
    }

    #[test]
    fn test_until_next_midnight_known_point() {
        let naive = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(23, 59, 30)
            .unwrap();
        let now = Local.from_local_datetime(&naive).earliest().unwrap();
        let d = until_next_midnight(now);
        assert_eq!(d, Duration::from_secs(30));
    }

    #[test]
    fn test_numbered() {
        assert_eq!(
            numbered(Path::new("/var/log/app.log"), 3),
            PathBuf::from("/var/log/app.log.3")
        );
    }

    #[test]
    fn test_find_free_sequence_skips_gz() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(dir.path().join("app.log.1.gz"), b"old").unwrap();

        assert_eq!(find_free_sequence(&path, 1, true), 2);
        // uncompressed probe ignores the .gz leftover
        assert_eq!(find_free_sequence(&path, 1, false), 1);
    }
}
