//! GraphQL documents and the response shapes they decode into.

use serde::Deserialize;

use super::api::{AccountId, CommitStat, HistoryPage, RepoPage};
use crate::types::{RepoKey, RepoRef};

/// Repositories per listing page. Larger pages tend to time out with a 502.
pub const LISTING_PAGE_SIZE: u32 = 60;

/// Commits per history page (the service maximum).
pub const HISTORY_PAGE_SIZE: u32 = 100;

/// Repositories per page when counting stars.
pub const STATS_PAGE_SIZE: u32 = 100;

pub const ACCOUNT_QUERY: &str = r#"
query($login: String!) {
    user(login: $login) {
        id
    }
}"#;

pub const FOLLOWERS_QUERY: &str = r#"
query($login: String!) {
    user(login: $login) {
        followers {
            totalCount
        }
    }
}"#;

pub const REPO_STATS_QUERY: &str = r#"
query($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String, $first: Int!) {
    user(login: $login) {
        repositories(first: $first, after: $cursor, ownerAffiliations: $owner_affiliation) {
            totalCount
            edges {
                node {
                    ... on Repository {
                        nameWithOwner
                        stargazers {
                            totalCount
                        }
                    }
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}"#;

pub const LISTING_QUERY: &str = r#"
query($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String, $first: Int!) {
    user(login: $login) {
        repositories(first: $first, after: $cursor, ownerAffiliations: $owner_affiliation) {
            edges {
                node {
                    ... on Repository {
                        nameWithOwner
                        defaultBranchRef {
                            target {
                                ... on Commit {
                                    history {
                                        totalCount
                                    }
                                }
                            }
                        }
                    }
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}"#;

pub const HISTORY_QUERY: &str = r#"
query($repo_name: String!, $owner: String!, $cursor: String, $first: Int!) {
    repository(name: $repo_name, owner: $owner) {
        defaultBranchRef {
            target {
                ... on Commit {
                    history(first: $first, after: $cursor) {
                        edges {
                            node {
                                author {
                                    user {
                                        id
                                    }
                                }
                                additions
                                deletions
                            }
                        }
                        pageInfo {
                            endCursor
                            hasNextPage
                        }
                    }
                }
            }
        }
    }
}"#;

/// Top-level GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl GraphQlError {
    pub fn is_rate_limit(&self) -> bool {
        self.kind.as_deref() == Some("RATE_LIMITED")
    }
}

#[derive(Debug, Deserialize)]
pub struct UserData<U> {
    pub user: Option<U>,
}

#[derive(Debug, Deserialize)]
pub struct AccountNode {
    pub id: String,
}

impl From<AccountNode> for AccountId {
    fn from(node: AccountNode) -> Self {
        AccountId(node.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct Count {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct FollowersNode {
    pub followers: Count,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct Edge<N> {
    pub node: N,
}

#[derive(Debug, Deserialize)]
pub struct RepositoriesNode<N> {
    pub repositories: Connection<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    #[serde(default)]
    pub total_count: Option<u64>,
    pub edges: Vec<Edge<N>>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarNode {
    pub name_with_owner: String,
    pub stargazers: Count,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingNode {
    pub name_with_owner: String,
    pub default_branch_ref: Option<BranchRef<CountTarget>>,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef<T> {
    pub target: Option<T>,
}

/// `target` is only a commit when the default branch points at one;
/// otherwise the inline fragment leaves `history` absent.
#[derive(Debug, Deserialize)]
pub struct CountTarget {
    #[serde(default)]
    pub history: Option<Count>,
}

impl ListingNode {
    /// Convert into a live repository reference.
    pub fn into_repo_ref(self) -> Result<RepoRef, String> {
        let key: RepoKey = self
            .name_with_owner
            .parse()
            .map_err(|e| format!("bad nameWithOwner {:?}: {}", self.name_with_owner, e))?;
        let total_commits = self
            .default_branch_ref
            .and_then(|branch| branch.target)
            .and_then(|target| target.history)
            .map(|history| history.total_count);
        Ok(RepoRef::new(key, total_commits))
    }
}

impl Connection<ListingNode> {
    pub fn into_page(self) -> Result<RepoPage, String> {
        let repos = self
            .edges
            .into_iter()
            .map(|edge| edge.node.into_repo_ref())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RepoPage {
            repos,
            end_cursor: self.page_info.end_cursor,
            has_next_page: self.page_info.has_next_page,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryData {
    pub repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRepository {
    pub default_branch_ref: Option<BranchRef<HistoryTarget>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryTarget {
    #[serde(default)]
    pub history: Option<Connection<CommitNode>>,
}

#[derive(Debug, Deserialize)]
pub struct CommitNode {
    pub author: Option<CommitAuthor>,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub user: Option<AccountNode>,
}

impl RepositoryData {
    /// Extract the history page, or `None` for a repository without a default branch.
    pub fn into_history_page(self) -> Option<HistoryPage> {
        let history = self
            .repository?
            .default_branch_ref?
            .target?
            .history?;
        let commits = history
            .edges
            .into_iter()
            .map(|edge| CommitStat {
                author: edge
                    .node
                    .author
                    .and_then(|author| author.user)
                    .map(AccountId::from),
                additions: edge.node.additions,
                deletions: edge.node.deletions,
            })
            .collect();
        Some(HistoryPage {
            commits,
            end_cursor: history.page_info.end_cursor,
            has_next_page: history.page_info.has_next_page,
        })
    }
}
