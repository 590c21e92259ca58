//! One-way identity hashing for cache keys.
//!
//! Repository names and account logins never appear in clear text on disk;
//! they are stored as lowercase hex SHA-256 digests.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// Width of a hex-encoded SHA-256 digest.
pub const HASH_WIDTH: usize = 64;

/// Fixed-width opaque identity of a repository (or account) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoHash(String);

impl RepoHash {
    /// Hash a fully-qualified name such as `owner/name`.
    pub fn of(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RepoHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_WIDTH {
            return Err(format!(
                "expected {} hex characters, found {}",
                HASH_WIDTH,
                s.len()
            ));
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex character {:?}", c));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for RepoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
