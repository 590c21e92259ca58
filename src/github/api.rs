//! The seam between LOC accounting and the remote GraphQL service.

use std::fmt;

use thiserror::Error;

use crate::types::{Affiliation, RepoKey, RepoRef};

/// Remote operations, used to attribute call counts and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Account,
    Followers,
    RepoStats,
    Listing,
    History,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Account,
        Operation::Followers,
        Operation::RepoStats,
        Operation::Listing,
        Operation::History,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Account => "account",
            Operation::Followers => "followers",
            Operation::RepoStats => "repo_stats",
            Operation::Listing => "repo_listing",
            Operation::History => "commit_history",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of remote calls made per operation during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryCounts {
    calls: [u32; Operation::ALL.len()],
}

impl QueryCounts {
    pub fn record(&mut self, op: Operation) {
        self.calls[op.slot()] += 1;
    }

    pub fn get(&self, op: Operation) -> u32 {
        self.calls[op.slot()]
    }

    pub fn total(&self) -> u32 {
        self.calls.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, u32)> + '_ {
        Operation::ALL.into_iter().map(|op| (op, self.get(op)))
    }
}

impl fmt::Display for QueryCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (op, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", op, count)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors returned by remote calls. None of them are retried.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The service signalled a rate limit (HTTP 403/429 or a `RATE_LIMITED` error).
    #[error(
        "{operation} hit the rate limit (HTTP {status}): too many requests in a short amount of time; calls so far: {counts}"
    )]
    RateLimited {
        operation: Operation,
        status: u16,
        counts: QueryCounts,
    },
    /// Any other non-success HTTP status.
    #[error("{operation} failed with HTTP {status}: {body}; calls so far: {counts}")]
    Protocol {
        operation: Operation,
        status: u16,
        body: String,
        counts: QueryCounts,
    },
    /// The request never produced an HTTP response.
    #[error("{operation} transport error: {message}; calls so far: {counts}")]
    Transport {
        operation: Operation,
        message: String,
        counts: QueryCounts,
    },
    /// HTTP 200 carrying GraphQL errors and no data.
    #[error("{operation} returned errors: {}; calls so far: {counts}", .messages.join("; "))]
    GraphQl {
        operation: Operation,
        messages: Vec<String>,
        counts: QueryCounts,
    },
    /// The response body did not have the expected shape.
    #[error("{operation} returned an unexpected response: {message}")]
    Decode {
        operation: Operation,
        message: String,
    },
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}

/// Opaque node id of the tracked account, used to attribute commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of the repository listing.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    pub repos: Vec<RepoRef>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Line statistics of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStat {
    /// Linked account of the commit author; `None` when the author email
    /// does not resolve to an account.
    pub author: Option<AccountId>,
    pub additions: u64,
    pub deletions: u64,
}

/// One page of a repository's default-branch history.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub commits: Vec<CommitStat>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Paginated remote queries the LOC cache depends on.
///
/// Every call is a blocking round-trip.
pub trait GitHubApi {
    /// Fetch one page of repositories reachable through `affiliations`.
    fn repositories_page(
        &mut self,
        affiliations: &[Affiliation],
        cursor: Option<&str>,
    ) -> Result<RepoPage, ApiError>;

    /// Fetch one page of commit history for `repo`.
    ///
    /// Returns `Ok(None)` when the repository has no default branch.
    fn commit_history_page(
        &mut self,
        repo: &RepoKey,
        cursor: Option<&str>,
    ) -> Result<Option<HistoryPage>, ApiError>;

    /// Resolve the full live repository list, following every page in order.
    fn all_repositories(&mut self, affiliations: &[Affiliation]) -> Result<Vec<RepoRef>, ApiError> {
        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.repositories_page(affiliations, cursor.as_deref())?;
            log::debug!("Listed {} repositories", page.repos.len());
            repos.extend(page.repos);

            match page.end_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => return Ok(repos),
            }
        }
    }
}
