//! Scripted in-memory `GitHubApi` for tests.

use std::collections::HashMap;

use super::api::{
    AccountId, ApiError, CommitStat, GitHubApi, HistoryPage, Operation, QueryCounts, RepoPage,
};
use crate::types::{Affiliation, RepoKey, RepoRef};

pub const ME: &str = "MDQ6VXNlcjE=";
pub const OTHER: &str = "MDQ6VXNlcjI=";

pub fn me() -> AccountId {
    AccountId(ME.to_string())
}

/// A commit authored by `author` (`None` for an unlinked author).
pub fn commit(author: Option<&str>, additions: u64, deletions: u64) -> CommitStat {
    CommitStat {
        author: author.map(|id| AccountId(id.to_string())),
        additions,
        deletions,
    }
}

/// Serves repository listings and commit histories from memory.
///
/// History pages are addressed by cursors of the form `page-N`.
#[derive(Default)]
pub struct FakeGitHub {
    pub repos: Vec<RepoRef>,
    pub histories: HashMap<RepoKey, Vec<Vec<CommitStat>>>,
    /// Repositories whose history call fails, after how many successful
    /// pages, and with which error.
    pub failures: HashMap<RepoKey, (usize, ApiError)>,
    /// Affiliation each repository is listed under; `Owner` when absent.
    pub affiliations: HashMap<RepoKey, Affiliation>,
    pub history_calls: Vec<RepoKey>,
    pub counts: QueryCounts,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, name: &str, pages: Vec<Vec<CommitStat>>) -> Self {
        let key: RepoKey = name.parse().unwrap();
        let total: usize = pages.iter().map(Vec::len).sum();
        self.repos.push(RepoRef::new(key.clone(), Some(total as u64)));
        self.histories.insert(key, pages);
        self
    }

    pub fn with_empty_repo(mut self, name: &str) -> Self {
        self.repos.push(RepoRef::new(name.parse().unwrap(), None));
        self
    }

    pub fn with_affiliation(mut self, name: &str, affiliation: Affiliation) -> Self {
        self.affiliations.insert(name.parse().unwrap(), affiliation);
        self
    }

    /// Fail history calls for `name` with `error` once `after_pages` pages
    /// have been served.
    pub fn fail(mut self, name: &str, after_pages: usize, error: ApiError) -> Self {
        self.failures.insert(name.parse().unwrap(), (after_pages, error));
        self
    }

    pub fn rate_limit(self, name: &str, after_pages: usize) -> Self {
        self.fail(
            name,
            after_pages,
            ApiError::RateLimited {
                operation: Operation::History,
                status: 403,
                counts: QueryCounts::default(),
            },
        )
    }

    /// Append commits to an existing repository as a new last page.
    pub fn push_commits(&mut self, name: &str, commits: Vec<CommitStat>) {
        let key: RepoKey = name.parse().unwrap();
        let added = commits.len() as u64;
        self.histories.entry(key.clone()).or_default().push(commits);
        for repo in self.repos.iter_mut().filter(|r| r.key == key) {
            repo.total_commits = Some(repo.total_commits.unwrap_or(0) + added);
        }
    }

    pub fn crawled(&self, name: &str) -> usize {
        let key: RepoKey = name.parse().unwrap();
        self.history_calls.iter().filter(|k| **k == key).count()
    }
}

impl GitHubApi for FakeGitHub {
    fn repositories_page(
        &mut self,
        affiliations: &[Affiliation],
        _cursor: Option<&str>,
    ) -> Result<RepoPage, ApiError> {
        self.counts.record(Operation::Listing);
        let repos = self
            .repos
            .iter()
            .filter(|repo| {
                let affiliation = self
                    .affiliations
                    .get(&repo.key)
                    .copied()
                    .unwrap_or(Affiliation::Owner);
                affiliations.contains(&affiliation)
            })
            .cloned()
            .collect();
        Ok(RepoPage {
            repos,
            end_cursor: None,
            has_next_page: false,
        })
    }

    fn commit_history_page(
        &mut self,
        repo: &RepoKey,
        cursor: Option<&str>,
    ) -> Result<Option<HistoryPage>, ApiError> {
        self.counts.record(Operation::History);
        self.history_calls.push(repo.clone());

        let index = match cursor {
            None => 0,
            Some(cursor) => cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap(),
        };
        if let Some((after, error)) = self.failures.get(repo) {
            if index >= *after {
                return Err(error.clone());
            }
        }

        let Some(pages) = self.histories.get(repo) else {
            return Ok(None);
        };
        let commits = pages.get(index).cloned().unwrap_or_default();
        let has_next_page = index + 1 < pages.len();
        Ok(Some(HistoryPage {
            commits,
            end_cursor: has_next_page.then(|| format!("page-{}", index + 1)),
            has_next_page,
        }))
    }
}
