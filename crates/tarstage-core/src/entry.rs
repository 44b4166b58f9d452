//! Archive entry interface consumed by the extractor.
//!
//! The extractor never parses archive formats itself. It pulls entries from
//! any iterator of [`ArchiveEntry`] values, reads each one at most once while
//! it is current, and moves on.

use std::borrow::Cow;
use std::io::Cursor;
use std::io::Read;

use crate::ExtractionError;
use crate::Result;

/// What an archive entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file with byte content.
    File,
    /// Directory.
    Directory,
    /// Anything else (symlink, hardlink, device, metadata record). Skipped.
    Other,
}

/// One entry of a forward-only archive stream.
pub trait ArchiveEntry: Read {
    /// Name recorded in the archive, `/`-separated.
    fn name(&self) -> Result<Cow<'_, str>>;

    /// Kind of the entry.
    fn kind(&self) -> EntryKind;

    /// Declared size of the entry's content in bytes.
    fn size(&self) -> u64;
}

impl<R: Read> ArchiveEntry for tar::Entry<'_, R> {
    fn name(&self) -> Result<Cow<'_, str>> {
        let path = self.path()?;
        match path {
            Cow::Borrowed(p) => p.to_str().map(Cow::Borrowed).ok_or_else(|| {
                ExtractionError::InvalidEntryName {
                    name: p.to_string_lossy().into_owned(),
                }
            }),
            Cow::Owned(p) => p.into_os_string().into_string().map(Cow::Owned).map_err(|raw| {
                ExtractionError::InvalidEntryName {
                    name: raw.to_string_lossy().into_owned(),
                }
            }),
        }
    }

    fn kind(&self) -> EntryKind {
        let entry_type = self.header().entry_type();
        if entry_type.is_file() {
            EntryKind::File
        } else if entry_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        }
    }

    fn size(&self) -> u64 {
        tar::Entry::size(self)
    }
}

/// Entry backed by owned bytes.
///
/// Used by tests and benches, and by callers that already hold entry data in
/// memory.
///
/// # Examples
///
/// ```
/// use tarstage_core::{ArchiveEntry, EntryKind, MemoryEntry};
///
/// let entry = MemoryEntry::file("a/x.txt", vec![0u8; 10]);
/// assert_eq!(entry.kind(), EntryKind::File);
/// assert_eq!(entry.size(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    name: String,
    kind: EntryKind,
    declared_size: u64,
    data: Cursor<Vec<u8>>,
}

impl MemoryEntry {
    /// Creates a regular file entry.
    pub fn file(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            kind: EntryKind::File,
            declared_size: data.len() as u64,
            data: Cursor::new(data),
        }
    }

    /// Creates a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::empty(name, EntryKind::Directory)
    }

    /// Creates an entry of a kind the extractor skips.
    pub fn other(name: impl Into<String>) -> Self {
        Self::empty(name, EntryKind::Other)
    }

    /// Overrides the declared size reported by [`ArchiveEntry::size`].
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    fn empty(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_size: 0,
            data: Cursor::new(Vec::new()),
        }
    }
}

impl Read for MemoryEntry {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}

impl ArchiveEntry for MemoryEntry {
    fn name(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(&self.name))
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn size(&self) -> u64 {
        self.declared_size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_utils::TarTestBuilder;

    #[test]
    fn test_memory_entry_file() {
        let mut entry = MemoryEntry::file("a/x.txt", b"hello".to_vec());
        assert_eq!(entry.name().unwrap(), "a/x.txt");
        assert_eq!(entry.size(), 5);

        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_memory_entry_directory() {
        let entry = MemoryEntry::directory("a/");
        assert_eq!(entry.kind(), EntryKind::Directory);
        assert_eq!(entry.size(), 0);
    }

    #[test]
    fn test_memory_entry_declared_size_override() {
        let entry = MemoryEntry::file("big", vec![1u8; 4]).with_declared_size(2 * 1024 * 1024);
        assert_eq!(entry.size(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_tar_entry_kinds() {
        let data = TarTestBuilder::new()
            .add_directory("package/")
            .add_file("package/readme.txt", b"hi")
            .add_symlink("package/link", "readme.txt")
            .build();

        let mut archive = tar::Archive::new(std::io::Cursor::new(data));
        let kinds: Vec<(String, EntryKind, u64)> = archive
            .entries()
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry.name().unwrap().trim_end_matches('/').to_string(),
                    ArchiveEntry::kind(&entry),
                    ArchiveEntry::size(&entry),
                )
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("package".to_string(), EntryKind::Directory, 0),
                ("package/readme.txt".to_string(), EntryKind::File, 2),
                ("package/link".to_string(), EntryKind::Other, 0),
            ]
        );
    }
}
