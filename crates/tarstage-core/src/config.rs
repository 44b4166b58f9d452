//! Configuration for the write buffer and the extraction router.

use std::time::Duration;

/// Default time a producer waits for buffer space before giving up.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default name of the drain worker thread.
pub const DEFAULT_DRAIN_THREAD_NAME: &str = "tarstage-drain";

/// Configuration for a [`BoundedWriteBuffer`](crate::BoundedWriteBuffer).
///
/// # Examples
///
/// ```
/// use tarstage_core::WriteBufferConfig;
///
/// let config = WriteBufferConfig::new(10 * 1024 * 1024).with_thread_name("untar-writer");
/// assert_eq!(config.capacity_bytes, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBufferConfig {
    /// Maximum number of payload bytes staged or in flight at once.
    pub capacity_bytes: u64,

    /// Name given to the background drain thread.
    pub thread_name: String,
}

impl WriteBufferConfig {
    /// Creates a configuration with the given capacity.
    #[must_use]
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            thread_name: DEFAULT_DRAIN_THREAD_NAME.to_string(),
        }
    }

    /// Sets the drain thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for WriteBufferConfig {
    /// 1 MiB capacity.
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

/// Per-call options for [`Extractor`](crate::Extractor).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tarstage_core::ExtractOptions;
///
/// let options = ExtractOptions::default()
///     .with_pack_name(Some("mypack".to_string()))
///     .with_small_file_threshold(Some(512 * 1024))
///     .with_enqueue_timeout(Duration::from_secs(5));
/// assert_eq!(options.small_file_threshold, Some(512 * 1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Top-level folder name stripped from entry names when the archive
    /// does not use the conventional `package/` root.
    ///
    /// Default: `None`.
    pub pack_name: Option<String>,

    /// Files with a declared size above this are written directly even
    /// when a write buffer is available.
    ///
    /// Default: `None` (every file that fits the buffer is staged).
    pub small_file_threshold: Option<u64>,

    /// How long to wait for buffer space per staged file.
    ///
    /// Default: 60 seconds.
    pub enqueue_timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pack_name: None,
            small_file_threshold: None,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

impl ExtractOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pack name prefix to strip.
    #[must_use]
    pub fn with_pack_name(mut self, pack_name: Option<String>) -> Self {
        self.pack_name = pack_name;
        self
    }

    /// Sets the routing threshold.
    #[must_use]
    pub fn with_small_file_threshold(mut self, threshold: Option<u64>) -> Self {
        self.small_file_threshold = threshold;
        self
    }

    /// Sets the per-file enqueue timeout.
    #[must_use]
    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.pack_name.is_none());
        assert!(options.small_file_threshold.is_none());
        assert_eq!(options.enqueue_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_chain() {
        let options = ExtractOptions::new()
            .with_pack_name(Some("pack".into()))
            .with_small_file_threshold(Some(10))
            .with_enqueue_timeout(Duration::from_millis(5));
        assert_eq!(options.pack_name.as_deref(), Some("pack"));
        assert_eq!(options.small_file_threshold, Some(10));
        assert_eq!(options.enqueue_timeout, Duration::from_millis(5));
    }

    #[test]
    fn test_buffer_config_defaults() {
        let config = WriteBufferConfig::default();
        assert_eq!(config.capacity_bytes, 1024 * 1024);
        assert_eq!(config.thread_name, DEFAULT_DRAIN_THREAD_NAME);
    }
}
