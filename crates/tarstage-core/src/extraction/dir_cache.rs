//! Per-extraction record of directories already created.

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

/// Absolute directory paths created during one extraction call.
///
/// Lets the extractor skip repeated `create_dir_all` calls for files that
/// share a parent. Owned by a single call and never shared across threads.
#[derive(Debug, Default)]
pub struct DirCache {
    dirs: HashSet<PathBuf>,
}

impl DirCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `dir`, returning `true` if it was not cached yet.
    pub fn insert(&mut self, dir: &Path) -> bool {
        if self.dirs.contains(dir) {
            return false;
        }
        self.dirs.insert(dir.to_path_buf())
    }

    /// Whether `dir` was already recorded.
    #[must_use]
    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    /// Number of cached directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_new_entries() {
        let mut cache = DirCache::new();
        assert!(cache.insert(Path::new("/out/a")));
        assert!(!cache.insert(Path::new("/out/a")));
        assert!(cache.insert(Path::new("/out/a/b")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_contains() {
        let mut cache = DirCache::new();
        assert!(cache.is_empty());
        cache.insert(Path::new("/out"));
        assert!(cache.contains(Path::new("/out")));
        assert!(!cache.contains(Path::new("/out/other")));
    }
}
