//! Error conversion utilities for CLI.
//!
//! Converts tarstage-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::Result;
use anyhow::anyhow;
use std::path::Path;
use tarstage_core::ExtractionError;

/// Converts `ExtractionError` to user-friendly anyhow error with context
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    match err {
        ExtractionError::PathTraversal { path } => {
            anyhow!(
                "Archive '{}' contains an entry that escapes the output directory: '{}'\n\
                 HINT: The archive may be malicious. Do not extract from untrusted sources.",
                archive.display(),
                path.display()
            )
        }
        ExtractionError::CapacityExceeded { size, capacity } => {
            anyhow!(
                "A {size} byte file in '{}' cannot fit a {capacity} byte write buffer\n\
                 HINT: Use --small-file-threshold to route large files straight to disk.",
                archive.display()
            )
        }
        ExtractionError::Timeout { size, timeout } => {
            anyhow!(
                "Timed out after {}s waiting for {size} bytes of buffer space while extracting '{}'\n\
                 HINT: Use --buffer-size or --timeout to give the writer more room.",
                timeout.as_secs(),
                archive.display()
            )
        }
        ExtractionError::DuplicateKey { path } => {
            anyhow!(
                "Archive '{}' writes '{}' twice before the first write reached disk\n\
                 HINT: Extract without --buffer-size to let later entries overwrite earlier ones.",
                archive.display(),
                path.display()
            )
        }
        ExtractionError::BackgroundWrite { failures } => {
            let listed: Vec<String> = failures.iter().map(ToString::to_string).collect();
            anyhow!(
                "{} buffered write(s) from '{}' failed:\n  {}",
                failures.len(),
                archive.display(),
                listed.join("\n  ")
            )
        }
        ExtractionError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                archive.display(),
                io_err
            )
        }
        ExtractionError::UnsupportedFormat => {
            anyhow!(
                "Archive format not supported: {}\n\
                 HINT: Supported formats: tar, tar.gz, tgz",
                archive.display()
            )
        }
        ExtractionError::InvalidEntryName { name } => {
            anyhow!(
                "Invalid entry name in '{}': {name}\n\
                 HINT: The archive may be corrupted or malformed.",
                archive.display()
            )
        }
        err if err.is_buffer_error() => anyhow::Error::from(err).context(format!(
            "Write buffer refused work while extracting '{}'",
            archive.display()
        )),
        err => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds context to a generic error about archive operations
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}
