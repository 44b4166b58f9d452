//! Extraction statistics and progress reporting.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Statistics for one extraction call.
///
/// Counts reflect what the extractor did, not what has reached the disk:
/// files handed to a write buffer are counted once staged, and may still be
/// draining when the call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Files written directly or staged in the write buffer.
    pub files_created: usize,

    /// Directories newly created, whether listed in the archive or implied
    /// by a file's parent.
    pub directories_created: usize,

    /// Wall-clock time of the call.
    pub elapsed: Duration,

    /// Absolute root the entries were extracted under.
    pub output_root: PathBuf,

    /// Files that went through the write buffer.
    pub files_buffered: usize,

    /// Total file bytes written or staged.
    pub bytes_extracted: u64,

    /// Entries ignored because of their kind (symlinks, links, devices).
    pub entries_skipped: usize,
}

impl ExtractionStats {
    /// Creates empty statistics for `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Files streamed straight to disk.
    #[must_use]
    pub fn files_direct(&self) -> usize {
        self.files_created - self.files_buffered
    }
}

/// Receives progress updates while entries are extracted.
///
/// The entry stream is forward-only, so no total is known up front.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tarstage_core::ProgressCallback;
///
/// struct Counter(usize);
///
/// impl ProgressCallback for Counter {
///     fn on_entry_start(&mut self, _path: &Path, _current: usize) {}
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &Path) {
///         self.0 += 1;
///     }
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is handled. `current` is 1-indexed.
    fn on_entry_start(&mut self, path: &Path, current: usize);

    /// Called with the size of each file written or staged.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called after an entry was handled or skipped.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called once after the last entry.
    fn on_complete(&mut self);
}

/// `ProgressCallback` that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}
