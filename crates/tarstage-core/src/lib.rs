//! Archive extraction with a bounded background write buffer.
//!
//! `tarstage-core` extracts archive entry streams to disk while capping the
//! memory held by pending writes. Small files are read into memory and handed
//! to a [`BoundedWriteBuffer`], whose single drain thread persists them while
//! the caller moves on to the next entry. Large files, or every file when no
//! buffer is supplied, are streamed straight to disk.
//!
//! When the buffer is full, producers block until the drain worker frees
//! enough room, so peak memory never exceeds the configured capacity.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use tarstage_core::{BoundedWriteBuffer, ExtractOptions, extract_archive};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let buffer = BoundedWriteBuffer::new(10 * 1024 * 1024);
//! buffer.start()?;
//!
//! let options = ExtractOptions::default().with_small_file_threshold(Some(512 * 1024));
//! let stats = extract_archive(
//!     Path::new("package.tgz"),
//!     Path::new("/output/dir"),
//!     &options,
//!     Some(&buffer),
//! )?;
//!
//! buffer.wait_complete()?;
//! buffer.stop();
//! println!("Extracted {} files", stats.files_created);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod copy;
pub mod entry;
pub mod error;
pub mod extraction;
pub mod fs;
pub mod report;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use buffer::BoundedWriteBuffer;
pub use buffer::BufferState;
pub use config::ExtractOptions;
pub use config::WriteBufferConfig;
pub use entry::ArchiveEntry;
pub use entry::EntryKind;
pub use entry::MemoryEntry;
pub use error::ExtractionError;
pub use error::Result;
pub use error::WriteFailure;
pub use extraction::DirCache;
pub use extraction::Extractor;
pub use extraction::WriteRoute;
pub use extraction::extract;
pub use fs::Filesystem;
pub use fs::LocalFilesystem;
pub use report::ExtractionStats;
pub use report::NoopProgress;
pub use report::ProgressCallback;
pub use source::ArchiveType;
pub use source::detect_format;
pub use source::extract_archive;
pub use source::extract_archive_with_progress;
pub use source::open_archive;
pub use types::DestDir;
