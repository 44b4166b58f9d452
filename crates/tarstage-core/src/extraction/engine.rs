//! Extraction router: decides per entry between direct and buffered writes.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::DirCache;
use crate::ArchiveEntry;
use crate::BoundedWriteBuffer;
use crate::EntryKind;
use crate::ExtractOptions;
use crate::ExtractionStats;
use crate::ProgressCallback;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::copy::read_payload;
use crate::fs::Filesystem;
use crate::fs::LocalFilesystem;
use crate::report::NoopProgress;
use crate::types::DestDir;

/// Top-level folder that npm-style package archives wrap their content in.
const PACKAGE_ROOT: &str = "package";

/// How a file entry reaches the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRoute {
    /// Streamed to disk on the calling thread.
    Direct,
    /// Read into memory and handed to the write buffer.
    Buffered,
}

/// Extracts archive entry streams to a directory, staging small files
/// through an optional [`BoundedWriteBuffer`].
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tarstage_core::{BoundedWriteBuffer, ExtractOptions, Extractor, MemoryEntry};
///
/// # fn main() -> tarstage_core::Result<()> {
/// let buffer = BoundedWriteBuffer::new(1024 * 1024);
/// buffer.start()?;
///
/// let entries = vec![
///     Ok(MemoryEntry::directory("package/")),
///     Ok(MemoryEntry::file("package/readme.txt", b"hello".to_vec())),
/// ];
///
/// let extractor = Extractor::new(ExtractOptions::default());
/// let stats = extractor.extract(entries, Path::new("/tmp/out"), Some(&buffer))?;
/// buffer.wait_complete()?;
/// assert_eq!(stats.files_created, 1);
/// # Ok(())
/// # }
/// ```
pub struct Extractor {
    options: ExtractOptions,
    filesystem: Arc<dyn Filesystem>,
}

impl Extractor {
    /// Creates an extractor writing to the local filesystem.
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self::with_filesystem(options, Arc::new(LocalFilesystem))
    }

    /// Creates an extractor that performs directory creation and direct
    /// writes through `filesystem`.
    #[must_use]
    pub fn with_filesystem(options: ExtractOptions, filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            options,
            filesystem,
        }
    }

    /// Options this extractor was built with.
    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Picks the route for a file of declared `size`.
    ///
    /// Files go direct when there is no buffer, when they can never fit in
    /// it, or when they exceed the small-file threshold.
    #[must_use]
    pub fn route_for(&self, size: u64, write_buffer: Option<&BoundedWriteBuffer>) -> WriteRoute {
        let Some(buffer) = write_buffer else {
            return WriteRoute::Direct;
        };
        if size > buffer.capacity() {
            return WriteRoute::Direct;
        }
        match self.options.small_file_threshold {
            Some(threshold) if size > threshold => WriteRoute::Direct,
            _ => WriteRoute::Buffered,
        }
    }

    /// Extracts every entry under `output_root`.
    ///
    /// `output_root` is created if missing. With a `write_buffer`, staged
    /// files may still be draining when this returns; call
    /// [`BoundedWriteBuffer::wait_complete`] before relying on them.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that cannot be read, resolves outside
    /// `output_root`, cannot be written, or is rejected by the buffer.
    /// Entries already processed stay on disk.
    pub fn extract<I, E>(
        &self,
        entries: I,
        output_root: &Path,
        write_buffer: Option<&BoundedWriteBuffer>,
    ) -> Result<ExtractionStats>
    where
        I: IntoIterator<Item = std::io::Result<E>>,
        E: ArchiveEntry,
    {
        self.extract_with_progress(entries, output_root, write_buffer, &mut NoopProgress)
    }

    /// Like [`extract`](Self::extract), reporting progress per entry.
    pub fn extract_with_progress<I, E>(
        &self,
        entries: I,
        output_root: &Path,
        write_buffer: Option<&BoundedWriteBuffer>,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionStats>
    where
        I: IntoIterator<Item = std::io::Result<E>>,
        E: ArchiveEntry,
    {
        let started = Instant::now();
        let root = DestDir::from_path(output_root)?;
        self.filesystem.create_dir_all(root.as_path())?;

        let mut stats = ExtractionStats::new(root.as_path());
        let mut dirs = DirCache::new();
        dirs.insert(root.as_path());
        let mut copy_buffer = CopyBuffer::new();
        let mut staged = HashSet::new();

        tracing::debug!(
            root = %root.as_path().display(),
            buffered = write_buffer.is_some(),
            threshold = ?self.options.small_file_threshold,
            "starting extraction"
        );

        for (index, entry) in entries.into_iter().enumerate() {
            let mut entry = entry?;
            let kind = entry.kind();
            let size = entry.size();
            let relative = {
                let name = entry.name()?;
                strip_pack_prefix(&name, kind, self.options.pack_name.as_deref()).to_string()
            };
            let relative_path = Path::new(&relative);
            let target = root.resolve(relative_path)?;

            progress.on_entry_start(relative_path, index + 1);
            tracing::trace!(entry = %relative, ?kind, size, "processing entry");

            match kind {
                EntryKind::Directory => {
                    self.ensure_dir(&target, &mut dirs, &mut stats)?;
                }
                EntryKind::File => {
                    if let Some(parent) = target.parent() {
                        self.ensure_dir(parent, &mut dirs, &mut stats)?;
                    }
                    let written = self.write_file(
                        &mut entry,
                        size,
                        &target,
                        write_buffer,
                        &mut staged,
                        &mut copy_buffer,
                        &mut stats,
                    )?;
                    progress.on_bytes_written(written);
                }
                EntryKind::Other => {
                    tracing::warn!(entry = %relative, "skipping unsupported entry type");
                    stats.entries_skipped += 1;
                }
            }

            progress.on_entry_complete(relative_path);
        }

        stats.elapsed = started.elapsed();
        progress.on_complete();

        tracing::info!(
            root = %stats.output_root.display(),
            files = stats.files_created,
            buffered = stats.files_buffered,
            directories = stats.directories_created,
            skipped = stats.entries_skipped,
            elapsed = ?stats.elapsed,
            "extraction finished"
        );
        Ok(stats)
    }

    fn ensure_dir(
        &self,
        dir: &Path,
        dirs: &mut DirCache,
        stats: &mut ExtractionStats,
    ) -> Result<()> {
        if dirs.contains(dir) {
            return Ok(());
        }
        self.filesystem.create_dir_all(dir)?;
        dirs.insert(dir);
        stats.directories_created += 1;
        Ok(())
    }

    /// Writes one file entry. `staged` holds the targets this call handed
    /// to the buffer; a direct write to one of them waits for the staged
    /// payload to drain first so the later entry wins.
    #[allow(clippy::too_many_arguments)]
    fn write_file<R: Read>(
        &self,
        entry: &mut R,
        size: u64,
        target: &Path,
        write_buffer: Option<&BoundedWriteBuffer>,
        staged: &mut HashSet<PathBuf>,
        copy_buffer: &mut CopyBuffer,
        stats: &mut ExtractionStats,
    ) -> Result<u64> {
        let written = match (self.route_for(size, write_buffer), write_buffer) {
            (WriteRoute::Buffered, Some(buffer)) => {
                let payload = read_payload(entry, size)?;
                let len = payload.len() as u64;
                buffer.enqueue(target, payload, self.options.enqueue_timeout)?;
                staged.insert(target.to_path_buf());
                stats.files_buffered += 1;
                len
            }
            (_, buffer) => {
                if let Some(buffer) = buffer
                    && staged.remove(target)
                {
                    tracing::debug!(
                        path = %target.display(),
                        "waiting for staged write before direct write"
                    );
                    buffer.wait_path(target, self.options.enqueue_timeout)?;
                }
                tracing::trace!(path = %target.display(), size, "writing directly");
                let mut writer = self.filesystem.create_file(target)?;
                copy_with_buffer(entry, &mut writer, copy_buffer)?
            }
        };

        stats.files_created += 1;
        stats.bytes_extracted += written;
        Ok(written)
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Strips the archive's wrapping folder from an entry name.
///
/// `package/` is always removed; otherwise `<pack_name>/` is removed when a
/// pack name is given. Names without a matching prefix are returned as-is.
/// A directory entry naming the wrapping folder itself maps to the empty
/// path.
///
/// # Examples
///
/// ```
/// use tarstage_core::EntryKind;
/// use tarstage_core::extraction::strip_pack_prefix;
///
/// assert_eq!(strip_pack_prefix("package/src/lib.c", EntryKind::File, None), "src/lib.c");
/// assert_eq!(strip_pack_prefix("mypack/a.txt", EntryKind::File, Some("mypack")), "a.txt");
/// assert_eq!(strip_pack_prefix("other/a.txt", EntryKind::File, Some("mypack")), "other/a.txt");
/// ```
#[must_use]
pub fn strip_pack_prefix<'a>(name: &'a str, kind: EntryKind, pack_name: Option<&str>) -> &'a str {
    let is_dir = kind == EntryKind::Directory;
    strip_root(name, PACKAGE_ROOT, is_dir)
        .or_else(|| pack_name.and_then(|pack| strip_root(name, pack, is_dir)))
        .unwrap_or(name)
}

fn strip_root<'a>(name: &'a str, root: &str, is_dir: bool) -> Option<&'a str> {
    let rest = name.strip_prefix(root)?;
    if rest.is_empty() && is_dir {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// Extracts `entries` under `output_root` with default options apart from
/// the routing threshold.
///
/// Shorthand for [`Extractor::extract`].
///
/// # Errors
///
/// See [`Extractor::extract`].
pub fn extract<I, E>(
    entries: I,
    output_root: &Path,
    write_buffer: Option<&BoundedWriteBuffer>,
    small_file_threshold: Option<u64>,
) -> Result<ExtractionStats>
where
    I: IntoIterator<Item = std::io::Result<E>>,
    E: ArchiveEntry,
{
    let options = ExtractOptions::default().with_small_file_threshold(small_file_threshold);
    Extractor::new(options).extract(entries, output_root, write_buffer)
}
