//! Archive files as entry streams.
//!
//! Tar parsing and gzip decompression are delegated to the `tar` and
//! `flate2` crates; this module only picks the decoder and hands the
//! resulting entries to an [`Extractor`].

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::BoundedWriteBuffer;
use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionStats;
use crate::Extractor;
use crate::ProgressCallback;
use crate::Result;
use crate::report::NoopProgress;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveType {
    /// Uncompressed tar archive.
    Tar,
    /// Gzip-compressed tar archive (`.tar.gz`, `.tgz`).
    TarGz,
}

impl ArchiveType {
    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }
}

/// Detects the archive type from a file name, case-insensitively.
///
/// # Errors
///
/// Returns `ExtractionError::UnsupportedFormat` for anything other than
/// `.tar`, `.tar.gz` or `.tgz`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tarstage_core::{ArchiveType, detect_format};
///
/// assert_eq!(detect_format(Path::new("pkg.TGZ")).unwrap(), ArchiveType::TarGz);
/// assert!(detect_format(Path::new("pkg.zip")).is_err());
/// ```
pub fn detect_format(path: &Path) -> Result<ArchiveType> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(ExtractionError::UnsupportedFormat)?
        .to_ascii_lowercase();

    if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
        Ok(ArchiveType::TarGz)
    } else if file_name.ends_with(".tar") {
        Ok(ArchiveType::Tar)
    } else {
        Err(ExtractionError::UnsupportedFormat)
    }
}

/// Opens `path` as a tar archive, decompressing gzip when the name says so.
///
/// # Errors
///
/// Returns an error if the format is unsupported or the file cannot be
/// opened.
pub fn open_archive(path: &Path) -> Result<tar::Archive<Box<dyn Read>>> {
    let format = detect_format(path)?;
    let file = BufReader::new(File::open(path)?);

    let reader: Box<dyn Read> = match format {
        ArchiveType::Tar => Box::new(file),
        ArchiveType::TarGz => Box::new(GzDecoder::new(file)),
    };

    tracing::debug!(path = %path.display(), format = format.name(), "opened archive");
    Ok(tar::Archive::new(reader))
}

/// Extracts the archive at `archive_path` under `output_root`.
///
/// When `write_buffer` is given, small files may still be draining when this
/// returns.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or any entry fails to
/// extract.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tarstage_core::{BoundedWriteBuffer, ExtractOptions, extract_archive};
///
/// # fn main() -> tarstage_core::Result<()> {
/// let buffer = BoundedWriteBuffer::new(10 * 1024 * 1024);
/// buffer.start()?;
///
/// let stats = extract_archive(
///     Path::new("pkg.tgz"),
///     Path::new("/tmp/pkg"),
///     &ExtractOptions::default(),
///     Some(&buffer),
/// )?;
/// buffer.wait_complete()?;
/// println!("{} files", stats.files_created);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive(
    archive_path: &Path,
    output_root: &Path,
    options: &ExtractOptions,
    write_buffer: Option<&BoundedWriteBuffer>,
) -> Result<ExtractionStats> {
    extract_archive_with_progress(
        archive_path,
        output_root,
        options,
        write_buffer,
        &mut NoopProgress,
    )
}

/// Like [`extract_archive`], reporting progress per entry.
pub fn extract_archive_with_progress(
    archive_path: &Path,
    output_root: &Path,
    options: &ExtractOptions,
    write_buffer: Option<&BoundedWriteBuffer>,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionStats> {
    let mut archive = open_archive(archive_path)?;
    let extractor = Extractor::new(options.clone());
    extractor.extract_with_progress(archive.entries()?, output_root, write_buffer, progress)
}
