//! Shared types for ghstats

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Error type for parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing separator '/' in repo key")]
    MissingSeparator,
    #[error("owner cannot be empty")]
    EmptyOwner,
    #[error("repo name cannot be empty")]
    EmptyRepo,
}

/// Identifies a specific GitHub repository by its `nameWithOwner`.
///
/// The string is kept exactly as the service reported it; it is the input
/// to the cache identity hash. Logins that predate or sit outside the
/// public naming rules (underscores from managed accounts, trailing hyphens)
/// are accepted as long as both halves are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoKey {
    full_name: String,
    split: usize,
}

impl RepoKey {
    /// The owner login, everything before the first `/`.
    pub fn owner(&self) -> &str {
        &self.full_name[..self.split]
    }

    /// The repository name, everything after the first `/`.
    pub fn repo(&self) -> &str {
        &self.full_name[self.split + 1..]
    }

    /// The full `owner/name` string.
    pub fn as_str(&self) -> &str {
        &self.full_name
    }
}

impl FromStr for RepoKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find('/').ok_or(ParseError::MissingSeparator)?;
        if split == 0 {
            return Err(ParseError::EmptyOwner);
        }
        if split + 1 == s.len() {
            return Err(ParseError::EmptyRepo);
        }
        Ok(RepoKey {
            full_name: s.to_string(),
            split,
        })
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A repository as reported by the live listing.
///
/// `total_commits` is the commit count of the default branch, or `None` when
/// the repository is empty or has no default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub key: RepoKey,
    pub total_commits: Option<u64>,
}

impl RepoRef {
    /// Creates a reference from a key and its default-branch commit count.
    pub fn new(key: RepoKey, total_commits: Option<u64>) -> Self {
        Self { key, total_commits }
    }

    /// The fully-qualified `owner/name` string that identifies this repo in the cache.
    pub fn full_name(&self) -> &str {
        self.key.as_str()
    }
}

/// Ownership relation used to filter repository listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affiliation {
    Owner,
    Collaborator,
    OrganizationMember,
}

impl Affiliation {
    /// Every affiliation: the set used for LOC accounting and contributed repos.
    pub const ALL: [Affiliation; 3] = [
        Affiliation::Owner,
        Affiliation::Collaborator,
        Affiliation::OrganizationMember,
    ];

    /// Short lowercase name, as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Affiliation::Owner => "owner",
            Affiliation::Collaborator => "collaborator",
            Affiliation::OrganizationMember => "organization-member",
        }
    }

    /// Sorted, deduplicated copy of `affiliations`.
    pub fn normalized(affiliations: &[Affiliation]) -> Vec<Affiliation> {
        let mut set = affiliations.to_vec();
        set.sort();
        set.dedup();
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_repo_key() {
        let key: RepoKey = "octocat/hello-world".parse().unwrap();
        assert_eq!(key.owner(), "octocat");
        assert_eq!(key.repo(), "hello-world");
        assert_eq!(key.to_string(), "octocat/hello-world");
    }

    #[test]
    fn repo_key_keeps_logins_outside_public_rules() {
        for name in ["alice_acme/dotfiles", "legacy-/tool", "octocat/.github"] {
            let key: RepoKey = name.parse().unwrap();
            assert_eq!(key.as_str(), name);
        }
        let key: RepoKey = "alice_acme/dotfiles".parse().unwrap();
        assert_eq!(key.owner(), "alice_acme");
        assert_eq!(key.repo(), "dotfiles");
    }

    #[test]
    fn repo_key_splits_at_first_slash() {
        let key: RepoKey = "octocat/a/b".parse().unwrap();
        assert_eq!(key.owner(), "octocat");
        assert_eq!(key.repo(), "a/b");
    }

    #[test]
    fn invalid_repo_key_no_slash() {
        assert_eq!(
            "octocat".parse::<RepoKey>(),
            Err(ParseError::MissingSeparator)
        );
    }

    #[test]
    fn invalid_repo_key_empty_halves() {
        assert_eq!("/repo".parse::<RepoKey>(), Err(ParseError::EmptyOwner));
        assert_eq!("owner/".parse::<RepoKey>(), Err(ParseError::EmptyRepo));
    }

    #[test]
    fn repo_ref_full_name() {
        let key: RepoKey = "my-org/my_repo.v2".parse().unwrap();
        let repo = RepoRef::new(key, Some(3));
        assert_eq!(repo.full_name(), "my-org/my_repo.v2");
    }

    #[test]
    fn affiliation_serializes_as_graphql_enum() {
        let json = serde_json::to_string(&Affiliation::ALL).unwrap();
        assert_eq!(json, r#"["OWNER","COLLABORATOR","ORGANIZATION_MEMBER"]"#);
    }

    #[test]
    fn normalized_affiliations_ignore_order_and_repeats() {
        let set = Affiliation::normalized(&[
            Affiliation::OrganizationMember,
            Affiliation::Owner,
            Affiliation::OrganizationMember,
        ]);
        assert_eq!(
            set,
            vec![Affiliation::Owner, Affiliation::OrganizationMember]
        );
    }
}
