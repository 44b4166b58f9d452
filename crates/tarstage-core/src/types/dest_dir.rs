//! Output root for extraction and lexical path resolution beneath it.

use crate::ExtractionError;
use crate::Result;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// The absolute directory that extracted entries are written under.
///
/// The root is stored in absolute, lexically normalized form. Symlinks are
/// not resolved, and the directory itself is created by the extractor through
/// its [`Filesystem`](crate::Filesystem).
///
/// # Examples
///
/// ```
/// use tarstage_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::from_path("/tmp/extraction/./pkg")?;
/// let target = dest.resolve("src/lib.c")?;
/// assert!(target.starts_with(dest.as_path()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Makes `path` absolute without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Io` if the current directory is needed and
    /// cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let absolute = std::path::absolute(path.as_ref())?;
        Ok(Self(normalize(&absolute)))
    }

    /// Returns the root as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolves an entry-relative name beneath this root.
    ///
    /// See [`join_and_canonicalize`].
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        join_and_canonicalize(&self.0, relative.as_ref())
    }
}

impl AsRef<Path> for DestDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Joins `relative` onto `root` and normalizes the result lexically.
///
/// `.` components are dropped and `..` removes the previous component. The
/// result must stay at or below `root`: a `..` that would climb above it, or
/// a `relative` that is absolute or carries a drive prefix, is rejected. An
/// empty `relative` resolves to `root` itself.
///
/// # Errors
///
/// Returns `ExtractionError::PathTraversal` when the name escapes `root`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tarstage_core::types::join_and_canonicalize;
///
/// let root = Path::new("/out");
/// let resolved = join_and_canonicalize(root, Path::new("a/./b/../c.txt")).unwrap();
/// assert_eq!(resolved, Path::new("/out/a/c.txt"));
///
/// assert!(join_and_canonicalize(root, Path::new("../etc/passwd")).is_err());
/// ```
pub fn join_and_canonicalize(root: &Path, relative: &Path) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut depth: usize = 0;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(traversal(relative));
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(relative));
            }
        }
    }

    Ok(resolved)
}

fn traversal(relative: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        path: relative.to_path_buf(),
    }
}

// `std::path::absolute` keeps `..` on Unix.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dest_dir_is_absolute() {
        let dest = DestDir::from_path("relative/out").expect("should resolve");
        assert!(dest.as_path().is_absolute());
        assert!(dest.as_path().ends_with("relative/out"));
    }

    #[test]
    fn test_dest_dir_does_not_create_root() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().join("new").join("root");

        let dest = DestDir::from_path(&root).expect("should resolve");
        assert_eq!(dest.as_path(), root);
        assert!(!root.exists());
    }

    #[test]
    fn test_dest_dir_normalizes_dots() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let subdir = temp.path().join("subdir");

        let dest = DestDir::from_path(subdir.join(".").join("..")).expect("should resolve");
        assert_eq!(dest.as_path(), temp.path());
    }

    #[test]
    fn test_join_simple() {
        let resolved = join_and_canonicalize(Path::new("/out"), Path::new("a/x.txt")).unwrap();
        assert_eq!(resolved, PathBuf::from("/out/a/x.txt"));
    }

    #[test]
    fn test_join_empty_is_root() {
        let resolved = join_and_canonicalize(Path::new("/out"), Path::new("")).unwrap();
        assert_eq!(resolved, PathBuf::from("/out"));
    }

    #[test]
    fn test_join_inner_parent_stays_inside() {
        let resolved =
            join_and_canonicalize(Path::new("/out"), Path::new("a/b/../../c.txt")).unwrap();
        assert_eq!(resolved, PathBuf::from("/out/c.txt"));
    }

    #[test]
    fn test_join_rejects_escape() {
        let result = join_and_canonicalize(Path::new("/out"), Path::new("a/../../x"));
        assert!(matches!(
            result,
            Err(ExtractionError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_join_rejects_leading_parent() {
        let result = join_and_canonicalize(Path::new("/out"), Path::new("../etc/passwd"));
        assert!(matches!(
            result,
            Err(ExtractionError::PathTraversal { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_join_rejects_absolute() {
        let result = join_and_canonicalize(Path::new("/out"), Path::new("/etc/passwd"));
        assert!(matches!(
            result,
            Err(ExtractionError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_dest_resolve_delegates() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::from_path(temp.path()).expect("should resolve");
        let resolved = dest.resolve("dir/file").unwrap();
        assert_eq!(resolved, temp.path().join("dir").join("file"));
    }
}
