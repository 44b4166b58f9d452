//! Error types for buffered archive extraction.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// A background write that failed after its entry left the buffer.
///
/// The drain worker cannot return errors to the producer that enqueued the
/// entry, so failures are collected and handed back from
/// [`BoundedWriteBuffer::wait_complete`](crate::BoundedWriteBuffer::wait_complete)
/// or [`BoundedWriteBuffer::take_failures`](crate::BoundedWriteBuffer::take_failures).
#[derive(Debug)]
pub struct WriteFailure {
    /// Destination the worker tried to write.
    pub path: PathBuf,
    /// Underlying filesystem error.
    pub source: std::io::Error,
}

impl std::fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

/// Errors that can occur while staging writes or extracting entries.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write buffer was used before `start()` was called.
    #[error("write buffer has not been started")]
    NotStarted,

    /// The write buffer has been stopped and accepts no more work.
    #[error("write buffer has been stopped")]
    Stopped,

    /// A write for this destination is already pending in the buffer.
    #[error("duplicate pending write for {path}")]
    DuplicateKey {
        /// The destination path that is already staged.
        path: PathBuf,
    },

    /// Payload can never fit, even in an empty buffer.
    #[error("payload of {size} bytes exceeds buffer capacity of {capacity} bytes")]
    CapacityExceeded {
        /// Payload size in bytes.
        size: u64,
        /// Total buffer capacity in bytes.
        capacity: u64,
    },

    /// Room for the payload was not freed within the caller's budget.
    #[error("timed out after {timeout:?} waiting for {size} bytes of buffer space")]
    Timeout {
        /// Bytes the caller was waiting to stage (0 when waiting for a drain).
        size: u64,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Entry name resolves outside the output root.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry path that attempted traversal.
        path: PathBuf,
    },

    /// Entry name could not be read from the archive.
    #[error("invalid entry name: {name}")]
    InvalidEntryName {
        /// Lossy rendering of the offending name.
        name: String,
    },

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// One or more background writes failed.
    #[error("{} background write(s) failed, first: {}", failures.len(), first_failure(failures))]
    BackgroundWrite {
        /// Every failure recorded since the last drain of the failure list.
        failures: Vec<WriteFailure>,
    },
}

fn first_failure(failures: &[WriteFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

impl ExtractionError {
    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// Only [`ExtractionError::Timeout`] is transient: the buffer may have
    /// drained by the time the caller retries. `CapacityExceeded` is
    /// permanent for a given buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use tarstage_core::ExtractionError;
    ///
    /// let err = ExtractionError::Timeout {
    ///     size: 600,
    ///     timeout: Duration::from_millis(50),
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = ExtractionError::CapacityExceeded {
    ///     size: 2000,
    ///     capacity: 1024,
    /// };
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the error came from the write buffer contract
    /// rather than from the filesystem or the archive.
    #[must_use]
    pub const fn is_buffer_error(&self) -> bool {
        matches!(
            self,
            Self::NotStarted
                | Self::Stopped
                | Self::DuplicateKey { .. }
                | Self::CapacityExceeded { .. }
                | Self::Timeout { .. }
                | Self::BackgroundWrite { .. }
        )
    }

    /// Returns the recorded background write failures, if any.
    #[must_use]
    pub fn failures(&self) -> &[WriteFailure] {
        match self {
            Self::BackgroundWrite { failures } => failures,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::NotStarted;
        assert_eq!(err.to_string(), "write buffer has not been started");
    }

    #[test]
    fn test_capacity_exceeded_display() {
        let err = ExtractionError::CapacityExceeded {
            size: 2000,
            capacity: 1024,
        };
        let display = err.to_string();
        assert!(display.contains("2000"));
        assert!(display.contains("1024"));
        assert!(!err.is_retryable());
        assert!(err.is_buffer_error());
    }

    #[test]
    fn test_duplicate_key_display() {
        let err = ExtractionError::DuplicateKey {
            path: PathBuf::from("/out/a/x.txt"),
        };
        assert!(err.to_string().contains("/out/a/x.txt"));
    }

    #[test]
    fn test_path_traversal_error() {
        let err = ExtractionError::PathTraversal {
            path: PathBuf::from("../etc/passwd"),
        };
        assert!(err.to_string().contains("path traversal"));
        assert!(!err.is_buffer_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExtractionError = io_err.into();
        assert!(matches!(err, ExtractionError::Io(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_background_write_display() {
        let err = ExtractionError::BackgroundWrite {
            failures: vec![
                WriteFailure {
                    path: PathBuf::from("/out/a"),
                    source: std::io::Error::other("disk full"),
                },
                WriteFailure {
                    path: PathBuf::from("/out/b"),
                    source: std::io::Error::other("disk full"),
                },
            ],
        };
        let display = err.to_string();
        assert!(display.starts_with("2 background write(s) failed"));
        assert!(display.contains("/out/a"));
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_failures_empty_for_other_variants() {
        assert!(ExtractionError::Stopped.failures().is_empty());
    }
}
