//! On-disk LOC cache

mod file;
mod hash;
mod paths;
mod store;

pub use file::{CacheFile, CacheRow, DEFAULT_COMMENT_LINES, legend};
pub use hash::{HASH_WIDTH, RepoHash};
pub use paths::CachePaths;
pub use store::{CacheError, CacheStore};
