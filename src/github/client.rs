//! Blocking GraphQL client for the GitHub API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::api::{
    AccountId, ApiError, GitHubApi, HistoryPage, Operation, QueryCounts, RepoPage,
};
use super::queries::{
    self, AccountNode, Envelope, FollowersNode, ListingNode, RepositoriesNode, RepositoryData,
    StarNode, UserData,
};
use crate::types::{Affiliation, RepoKey};

/// Default GraphQL endpoint.
pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Repository and star totals for one affiliation set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStats {
    pub repositories: u64,
    pub stars: u64,
}

/// GraphQL client bound to one account and credential.
///
/// Tracks how many calls each operation made so failures and the final
/// report can show them.
pub struct GitHubClient {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
    login: String,
    counts: QueryCounts,
}

impl GitHubClient {
    pub fn new(login: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_timeout(login, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        login: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("ghstats/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            token: token.into(),
            login: login.into(),
            counts: QueryCounts::default(),
        }
    }

    /// Point the client at a different GraphQL endpoint (GHES, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn counts(&self) -> &QueryCounts {
        &self.counts
    }

    /// Resolve the tracked account's node id.
    pub fn account_id(&mut self) -> Result<AccountId, ApiError> {
        let variables = json!({ "login": self.login });
        let data: UserData<AccountNode> =
            self.query(Operation::Account, queries::ACCOUNT_QUERY, variables)?;
        let user = self.require_user(Operation::Account, data.user)?;
        Ok(user.into())
    }

    pub fn followers(&mut self) -> Result<u64, ApiError> {
        let variables = json!({ "login": self.login });
        let data: UserData<FollowersNode> =
            self.query(Operation::Followers, queries::FOLLOWERS_QUERY, variables)?;
        let user = self.require_user(Operation::Followers, data.user)?;
        Ok(user.followers.total_count)
    }

    /// Count repositories and their stars across every listing page.
    pub fn repo_stats(&mut self, affiliations: &[Affiliation]) -> Result<RepoStats, ApiError> {
        let mut stats = RepoStats::default();
        let mut cursor: Option<String> = None;

        loop {
            let variables = json!({
                "owner_affiliation": affiliations,
                "login": self.login,
                "cursor": cursor,
                "first": queries::STATS_PAGE_SIZE,
            });
            let data: UserData<RepositoriesNode<StarNode>> =
                self.query(Operation::RepoStats, queries::REPO_STATS_QUERY, variables)?;
            let repositories = self.require_user(Operation::RepoStats, data.user)?.repositories;

            stats.repositories = repositories.total_count.unwrap_or(stats.repositories);
            for edge in &repositories.edges {
                log::trace!(
                    "{} has {} stars",
                    edge.node.name_with_owner,
                    edge.node.stargazers.total_count
                );
                stats.stars += edge.node.stargazers.total_count;
            }

            match repositories.page_info.end_cursor {
                Some(next) if repositories.page_info.has_next_page => cursor = Some(next),
                _ => return Ok(stats),
            }
        }
    }

    fn require_user<U>(&self, operation: Operation, user: Option<U>) -> Result<U, ApiError> {
        user.ok_or_else(|| ApiError::Decode {
            operation,
            message: format!("user {:?} not found", self.login),
        })
    }

    /// POST one GraphQL document and decode its `data`.
    fn query<T: DeserializeOwned>(
        &mut self,
        operation: Operation,
        document: &str,
        variables: Value,
    ) -> Result<T, ApiError> {
        self.counts.record(operation);
        log::trace!("POST {} ({})", self.endpoint, operation);

        let result = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("bearer {}", self.token))
            .send_json(json!({ "query": document, "variables": variables }));

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(classify_status(operation, status, body, self.counts));
            }
            Err(ureq::Error::Transport(e)) => {
                return Err(ApiError::Transport {
                    operation,
                    message: e.to_string(),
                    counts: self.counts,
                });
            }
        };

        let envelope: Envelope<T> = response.into_json().map_err(|e| ApiError::Decode {
            operation,
            message: e.to_string(),
        })?;
        unwrap_envelope(operation, envelope, self.counts)
    }
}

/// Map a non-success HTTP status to an error kind.
///
/// GitHub answers 403 for its undocumented anti-abuse limit and 429 for
/// secondary rate limits.
fn classify_status(operation: Operation, status: u16, body: String, counts: QueryCounts) -> ApiError {
    match status {
        403 | 429 => ApiError::RateLimited {
            operation,
            status,
            counts,
        },
        _ => ApiError::Protocol {
            operation,
            status,
            body,
            counts,
        },
    }
}

fn unwrap_envelope<T>(
    operation: Operation,
    envelope: Envelope<T>,
    counts: QueryCounts,
) -> Result<T, ApiError> {
    let errors = envelope.errors.unwrap_or_default();
    if errors.iter().any(|e| e.is_rate_limit()) {
        return Err(ApiError::RateLimited {
            operation,
            status: 200,
            counts,
        });
    }
    match envelope.data {
        Some(data) => {
            for error in &errors {
                log::warn!("{} returned a partial error: {}", operation, error.message);
            }
            Ok(data)
        }
        None if !errors.is_empty() => Err(ApiError::GraphQl {
            operation,
            messages: errors.into_iter().map(|e| e.message).collect(),
            counts,
        }),
        None => Err(ApiError::Decode {
            operation,
            message: "response has neither data nor errors".to_string(),
        }),
    }
}

impl GitHubApi for GitHubClient {
    fn repositories_page(
        &mut self,
        affiliations: &[Affiliation],
        cursor: Option<&str>,
    ) -> Result<RepoPage, ApiError> {
        let variables = json!({
            "owner_affiliation": affiliations,
            "login": self.login,
            "cursor": cursor,
            "first": queries::LISTING_PAGE_SIZE,
        });
        let data: UserData<RepositoriesNode<ListingNode>> =
            self.query(Operation::Listing, queries::LISTING_QUERY, variables)?;
        let user = self.require_user(Operation::Listing, data.user)?;
        user.repositories
            .into_page()
            .map_err(|message| ApiError::Decode {
                operation: Operation::Listing,
                message,
            })
    }

    fn commit_history_page(
        &mut self,
        repo: &RepoKey,
        cursor: Option<&str>,
    ) -> Result<Option<HistoryPage>, ApiError> {
        let variables = json!({
            "repo_name": repo.repo(),
            "owner": repo.owner(),
            "cursor": cursor,
            "first": queries::HISTORY_PAGE_SIZE,
        });
        let data: RepositoryData = self.query(Operation::History, queries::HISTORY_QUERY, variables)?;
        Ok(data.into_history_page())
    }
}
