//! Saves reconciled rows when a crawl aborts the run.

use std::path::PathBuf;

use super::crawler::Accumulator;
use crate::cache::{CacheFile, CacheStore};
use crate::types::RepoKey;

/// Writes the last known-good cache state after a fatal remote error.
///
/// Never suppresses the error that triggered it; callers propagate it after
/// [`RecoveryWriter::flush`] returns.
pub struct RecoveryWriter<'a> {
    store: &'a CacheStore,
}

impl<'a> RecoveryWriter<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    /// Overwrite the cache file with `snapshot`, the rows as they stood before
    /// the crawl of `in_flight` started.
    ///
    /// The partial totals of the failed crawl are only reported: a row is
    /// written once its repository has been crawled to the end. Returns the
    /// path written, or `None` if the write itself failed.
    pub fn flush(
        &self,
        snapshot: &CacheFile,
        in_flight: &RepoKey,
        partial: &Accumulator,
    ) -> Option<PathBuf> {
        log::info!(
            "Discarding partial totals for {}: +{} -{} over {} commits",
            in_flight,
            partial.additions,
            partial.deletions,
            partial.my_commits
        );

        match self.store.persist(snapshot) {
            Ok(()) => {
                let path = self.store.path().to_path_buf();
                log::warn!(
                    "Crawl of {} failed; saved {} cached rows to {}",
                    in_flight,
                    snapshot.rows.len(),
                    path.display()
                );
                eprintln!(
                    "There was an error while crawling {}. The cache file {} has had the partial data saved.",
                    in_flight,
                    path.display()
                );
                Some(path)
            }
            Err(e) => {
                log::error!("Failed to save partial cache after {} failed: {}", in_flight, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheRow, RepoHash, legend};
    use tempfile::tempdir;

    #[test]
    fn flush_overwrites_store_with_snapshot() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.txt"), 2);
        std::fs::write(store.path(), "stale\ncontent\ngarbage\n").unwrap();

        let snapshot = CacheFile::new(
            legend(2),
            vec![CacheRow {
                hash: RepoHash::of("octocat/a"),
                total_commits: 3,
                my_commits: 1,
                added: 9,
                deleted: 4,
            }],
        );
        let key: RepoKey = "octocat/b".parse().unwrap();

        let written = RecoveryWriter::new(&store).flush(&snapshot, &key, &Accumulator::default());
        assert_eq!(written.as_deref(), Some(store.path()));
        assert_eq!(store.load().unwrap().unwrap(), snapshot);
    }

    #[test]
    fn flush_reports_failed_write() {
        let dir = tempdir().unwrap();
        // A directory where the cache file should be makes the rename fail.
        let path = dir.path().join("cache.txt");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let store = CacheStore::new(&path, 0);
        let key: RepoKey = "octocat/b".parse().unwrap();

        let written = RecoveryWriter::new(&store).flush(&CacheFile::default(), &key, &Accumulator::default());
        assert!(written.is_none());
    }
}
