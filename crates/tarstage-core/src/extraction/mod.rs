//! Entry routing and on-disk extraction.

mod dir_cache;
mod engine;

pub use dir_cache::DirCache;
pub use engine::Extractor;
pub use engine::WriteRoute;
pub use engine::extract;
pub use engine::strip_pack_prefix;
