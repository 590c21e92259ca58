//! Brings the LOC cache up to date with the live repository list.

use super::StatsError;
use super::crawler::crawl_history;
use super::recovery::RecoveryWriter;
use crate::cache::{CacheFile, CacheRow, CacheStore, RepoHash};
use crate::github::{AccountId, GitHubApi};
use crate::types::{Affiliation, RepoRef};

/// Aggregate LOC totals of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocSummary {
    pub added: u64,
    pub deleted: u64,
    /// True when no repository needed crawling and the cache was not rebuilt.
    pub fully_cached: bool,
}

impl LocSummary {
    fn of(file: &CacheFile, fully_cached: bool) -> Self {
        Self {
            added: file.total_added(),
            deleted: file.total_deleted(),
            fully_cached,
        }
    }

    /// Lines added minus lines deleted.
    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

/// Drives one reconciliation pass against a cache store.
pub struct Reconciler<'a, A: GitHubApi + ?Sized> {
    api: &'a mut A,
    store: &'a CacheStore,
    author: &'a AccountId,
    force_rebuild: bool,
}

impl<'a, A: GitHubApi + ?Sized> Reconciler<'a, A> {
    pub fn new(api: &'a mut A, store: &'a CacheStore, author: &'a AccountId) -> Self {
        Self {
            api,
            store,
            author,
            force_rebuild: false,
        }
    }

    /// Zero every row before reconciling, as if the repository set had changed.
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// List the repositories reachable through `affiliations` and reconcile
    /// against them.
    pub fn run(self, affiliations: &[Affiliation]) -> Result<LocSummary, StatsError> {
        let live = self.api.all_repositories(affiliations)?;
        log::info!("Found {} repositories", live.len());
        self.reconcile(&live)
    }

    /// Reconcile the cache against an already resolved live list.
    ///
    /// Rows whose stored commit count differs from the live count are
    /// re-crawled from scratch. On a remote failure the rows reconciled so
    /// far are written out before the error is returned.
    pub fn reconcile(self, live: &[RepoRef]) -> Result<LocSummary, StatsError> {
        let mut fully_cached = true;
        let mut cache = match self.load_aligned(live)? {
            Some(cache) => cache,
            None => {
                fully_cached = false;
                self.store.rebuild_from_scratch(live)?
            }
        };

        for (index, repo) in live.iter().enumerate() {
            let hash = RepoHash::of(repo.full_name());

            let Some(live_total) = repo.total_commits else {
                log::debug!("{} is empty", repo.key);
                cache.rows[index] = CacheRow::zeroed(hash);
                continue;
            };
            if cache.rows[index].total_commits == live_total {
                continue;
            }

            fully_cached = false;
            log::debug!(
                "{} changed ({} -> {} commits), crawling",
                repo.key,
                cache.rows[index].total_commits,
                live_total
            );
            let totals = match crawl_history(&mut *self.api, &repo.key, self.author) {
                Ok(totals) => totals,
                Err(failure) => {
                    if failure.error.is_rate_limited() {
                        log::warn!(
                            "Rate limited after {} pages of {}",
                            failure.pages,
                            repo.key
                        );
                    }
                    RecoveryWriter::new(self.store).flush(&cache, &repo.key, &failure.partial);
                    return Err(failure.error.into());
                }
            };

            cache.rows[index] = CacheRow {
                hash,
                total_commits: live_total,
                // History may have grown since the listing; the next run re-crawls.
                my_commits: totals.my_commits.min(live_total),
                added: totals.additions,
                deleted: totals.deletions,
            };
        }

        self.store.persist(&cache)?;
        let summary = LocSummary::of(&cache, fully_cached);
        log::info!(
            "LOC +{} -{} ({})",
            summary.added,
            summary.deleted,
            if fully_cached { "cached" } else { "updated" }
        );
        Ok(summary)
    }

    /// Load the cache with rows in live order, creating the file if needed.
    ///
    /// Returns `None` when the cache must be rebuilt: forced, a different
    /// number of rows, unreadable records, or a different repository set.
    fn load_aligned(&self, live: &[RepoRef]) -> Result<Option<CacheFile>, StatsError> {
        let cache = match self.store.load() {
            Ok(Some(cache)) => cache,
            Ok(None) => self.store.initialize()?,
            Err(e) if e.is_invalid_content() => {
                log::warn!("Rebuilding cache: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if self.force_rebuild {
            log::info!("Rebuild forced");
            return Ok(None);
        }
        if cache.rows.len() != live.len() {
            log::info!(
                "Repository count changed ({} cached, {} live)",
                cache.rows.len(),
                live.len()
            );
            return Ok(None);
        }

        match cache.aligned_to(live) {
            Ok(cache) => Ok(Some(cache)),
            Err(e) => {
                log::warn!("Rebuilding cache: {}", e);
                Ok(None)
            }
        }
    }
}
