//! Subcommand implementations.

pub mod bench;
pub mod completion;
pub mod extract;
