//! Path types for extraction.
//!
//! Entry names are resolved against a [`DestDir`] with purely lexical rules;
//! nothing here follows symlinks.

pub mod dest_dir;

pub use dest_dir::DestDir;
pub use dest_dir::join_and_canonicalize;
