//! Filesystem collaborator used by the extractor and the drain worker.
//!
//! Everything that touches the disk goes through [`Filesystem`], so tests can
//! substitute failing or instrumented implementations.

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Filesystem operations needed for extraction.
pub trait Filesystem: Send + Sync {
    /// Creates a directory and all missing ancestors. Succeeds if it exists.
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Writes `data` to `path`, replacing any existing file.
    fn write_file(&self, path: &Path, data: &[u8]) -> std::io::Result<()>;

    /// Opens `path` for streaming writes, truncating any existing file.
    fn create_file(&self, path: &Path) -> std::io::Result<Box<dyn Write>>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, data)
    }

    fn create_file(&self, path: &Path) -> std::io::Result<Box<dyn Write>> {
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::with_capacity(64 * 1024, file)))
    }
}
