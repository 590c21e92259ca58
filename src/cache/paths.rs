//! Cache directory path management
//!
//! ```text
//! ~/.cache/ghstats/
//! ├── <sha256(login)>.txt                # all affiliations
//! └── <sha256(login)>-owner.txt          # any narrower affiliation set
//! ```

use std::path::PathBuf;

use super::hash::RepoHash;
use crate::types::Affiliation;

/// Manages the filesystem paths of the cache directory.
#[derive(Debug, Clone)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Creates paths rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache file for an account and the affiliation set its rows
    /// were listed with.
    ///
    /// The full set maps to `{root}/{sha256(login)}.txt`; any other set gets a
    /// suffix naming its members, e.g. `{sha256(login)}-owner+collaborator.txt`.
    /// Each set reconciles against its own repository list.
    pub fn account_file(&self, login: &str, affiliations: &[Affiliation]) -> PathBuf {
        let set = Affiliation::normalized(affiliations);
        let hash = RepoHash::of(login);
        if set.is_empty() || set == Affiliation::ALL {
            return self.root.join(format!("{}.txt", hash));
        }
        let suffix: Vec<&str> = set.iter().map(|a| a.name()).collect();
        self.root.join(format!("{}-{}.txt", hash, suffix.join("+")))
    }
}

impl Default for CachePaths {
    /// Uses `dirs::cache_dir()` + "ghstats", or `./cache` when there is no
    /// platform cache directory.
    fn default() -> Self {
        match dirs::cache_dir() {
            Some(dir) => Self::new(dir.join("ghstats")),
            None => Self::new("cache"),
        }
    }
}
