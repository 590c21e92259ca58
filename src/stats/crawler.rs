//! Walks a repository's default-branch history page by page and totals the
//! lines changed by the tracked account.

use crate::github::{AccountId, ApiError, GitHubApi, HistoryPage};
use crate::types::RepoKey;

/// Running totals for one repository crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub additions: u64,
    pub deletions: u64,
    pub my_commits: u64,
}

impl Accumulator {
    /// Add every commit in `page` authored by `author`.
    pub fn absorb(&mut self, page: &HistoryPage, author: &AccountId) {
        for commit in page
            .commits
            .iter()
            .filter(|commit| commit.author.as_ref() == Some(author))
        {
            self.additions += commit.additions;
            self.deletions += commit.deletions;
            self.my_commits += 1;
        }
    }
}

/// A crawl that stopped on a remote error, with what it had totalled so far.
#[derive(Debug)]
pub struct CrawlFailure {
    pub error: ApiError,
    pub partial: Accumulator,
    pub pages: u32,
}

/// Crawl the full history of `repo`, counting commits authored by `author`.
///
/// A repository without a default branch, or whose first page is empty,
/// yields zero totals. Crawls always start from the newest commit; there is
/// no resuming from a cursor across runs.
pub fn crawl_history<A: GitHubApi + ?Sized>(
    api: &mut A,
    repo: &RepoKey,
    author: &AccountId,
) -> Result<Accumulator, CrawlFailure> {
    let mut totals = Accumulator::default();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = match api.commit_history_page(repo, cursor.as_deref()) {
            Ok(Some(page)) => page,
            Ok(None) => {
                log::debug!("{} has no default branch", repo);
                return Ok(totals);
            }
            Err(error) => {
                return Err(CrawlFailure {
                    error,
                    partial: totals,
                    pages,
                });
            }
        };
        pages += 1;
        totals.absorb(&page, author);
        log::trace!(
            "{} page {}: {} commits, {} mine so far",
            repo,
            pages,
            page.commits.len(),
            totals.my_commits
        );

        if page.commits.is_empty() || !page.has_next_page {
            break;
        }
        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                log::warn!("{} reported another page without a cursor", repo);
                break;
            }
        }
    }

    log::debug!(
        "Crawled {} in {} pages: +{} -{} over {} commits",
        repo,
        pages,
        totals.additions,
        totals.deletions,
        totals.my_commits
    );
    Ok(totals)
}
