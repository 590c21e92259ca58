//! GitHub GraphQL access

mod api;
mod client;
#[cfg(test)]
pub mod fake;
mod queries;

pub use api::{
    AccountId, ApiError, CommitStat, GitHubApi, HistoryPage, Operation, QueryCounts, RepoPage,
};
pub use client::{GRAPHQL_ENDPOINT, GitHubClient, RepoStats};
