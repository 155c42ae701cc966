//! Constants and default values for rotolog

/// Default max log file size in bytes before rotation (1MB)
pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024;

/// Default number of rotated generations to keep
pub const DEFAULT_MAX_FILES: u32 = 5;

/// Default starting sequence number for retired files
pub const DEFAULT_START_SEQ: u32 = 1;

/// File mode for newly created log files (owner rw, group r)
pub const LOG_FILE_MODE: u32 = 0o640;

/// Suffix appended to compressed retired files
pub const GZ_SUFFIX: &str = "gz";

/// Name of the default logger instance
pub const STD_LOGGER: &str = "std";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        assert!(DEFAULT_MAX_SIZE > 0);
        assert!(DEFAULT_MAX_FILES > 0);
        assert_eq!(DEFAULT_START_SEQ, 1);
    }

    #[test]
    fn test_log_file_mode() {
        // owner rw, group r, no world access
        assert_eq!(LOG_FILE_MODE & 0o007, 0);
        assert_eq!(LOG_FILE_MODE & 0o700, 0o600);
    }
}
