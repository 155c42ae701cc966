//! Detached gzip compression of retired log files
//!
//! Compression is fire-and-forget: rotation never waits on it, and a failure
//! is only visible through the tracing diagnostics, never through the sink's
//! write path.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Compress `path` to `path.gz` on a background thread, removing the plain
/// file on success. The handle is returned for tests; production callers
/// drop it.
pub(crate) fn spawn_compress(path: PathBuf) -> JoinHandle<()> {
    std::thread::spawn(move || match gzip_file(&path) {
        Ok(gz) => debug!("compressed retired log {} -> {}", path.display(), gz.display()),
        Err(e) => warn!("failed to compress retired log {}: {}", path.display(), e),
    })
}

fn gzip_file(path: &Path) -> io::Result<PathBuf> {
    let mut gz_path = path.as_os_str().to_owned();
    gz_path.push(".");
    gz_path.push(rotolog_core::constants::GZ_SUFFIX);
    let gz_path = PathBuf::from(gz_path);

    let mut src = File::open(path)?;
    let dst = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(dst, Compression::default());
    io::copy(&mut src, &mut encoder)?;
    encoder.finish()?.sync_all()?;

    fs::remove_file(path)?;
    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_gzip_file_replaces_plain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log.1");
        fs::write(&path, b"some log content\n".repeat(100)).unwrap();

        let gz = gzip_file(&path).unwrap();
        assert_eq!(gz, dir.path().join("app.log.1.gz"));
        assert!(gz.exists());
        assert!(!path.exists());

        let mut decoder = GzDecoder::new(File::open(&gz).unwrap());
        let mut content = Vec::new();
        decoder.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"some log content\n".repeat(100));
    }

    #[test]
    fn test_spawn_compress_missing_source_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_compress(dir.path().join("nope.log.1"));
        handle.join().unwrap();
    }
}
