//! In-memory form of the LOC cache file and its line format.
//!
//! ```text
//! <comment line 1>
//! ...
//! <comment line N>
//! {hash:<64} {total:<5} {mine:<5} {added:<10} {deleted:<10}
//! ```

use std::collections::HashMap;
use std::fmt;

use super::CacheError;
use super::hash::RepoHash;
use crate::types::RepoRef;

/// Number of legend lines at the top of a cache file.
pub const DEFAULT_COMMENT_LINES: usize = 7;

const LEGEND: [&str; DEFAULT_COMMENT_LINES] = [
    "This is a cache of all of the repositories I own, have contributed to, or am a member of.",
    "",
    "repository (hashed)  total commits  my commits  LOC added by me  LOC deleted by me",
    r"         \                \                \           \__________________  \________",
    r"          \                \                \________________________     \          \",
    r"           \                \___________________________________     \     \          \",
    r"____________\___________________________________________________\_____\_____\__________\__________",
];

/// A fresh legend of exactly `lines` lines.
pub fn legend(lines: usize) -> Vec<String> {
    (0..lines)
        .map(|i| LEGEND.get(i).copied().unwrap_or_default().to_string())
        .collect()
}

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub hash: RepoHash,
    /// Default-branch commit count when the row was last crawled.
    pub total_commits: u64,
    /// Commits attributed to the tracked account; never exceeds `total_commits`.
    pub my_commits: u64,
    pub added: u64,
    pub deleted: u64,
}

impl CacheRow {
    pub fn zeroed(hash: RepoHash) -> Self {
        Self {
            hash,
            total_commits: 0,
            my_commits: 0,
            added: 0,
            deleted: 0,
        }
    }

    fn parse(line: &str, line_no: usize) -> Result<Self, CacheError> {
        let malformed = |reason: String| CacheError::Malformed {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[hash, total, mine, added, deleted] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected 5 fields, found {}",
                fields.len()
            )));
        };

        let hash: RepoHash = hash.parse().map_err(malformed)?;
        let number = |field: &str, name: &str| {
            field
                .parse::<u64>()
                .map_err(|e| malformed(format!("bad {} {:?}: {}", name, field, e)))
        };
        let row = CacheRow {
            hash,
            total_commits: number(total, "commit count")?,
            my_commits: number(mine, "my commits")?,
            added: number(added, "LOC added")?,
            deleted: number(deleted, "LOC deleted")?,
        };

        if row.my_commits > row.total_commits {
            return Err(malformed(format!(
                "my commits {} exceed total commits {}",
                row.my_commits, row.total_commits
            )));
        }
        Ok(row)
    }
}

impl fmt::Display for CacheRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<64} {:<5} {:<5} {:<10} {:<10}",
            self.hash.as_str(),
            self.total_commits,
            self.my_commits,
            self.added,
            self.deleted
        )
    }
}

/// Comment block plus one row per known repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheFile {
    pub comments: Vec<String>,
    pub rows: Vec<CacheRow>,
}

impl CacheFile {
    pub fn new(comments: Vec<String>, rows: Vec<CacheRow>) -> Self {
        Self { comments, rows }
    }

    /// Comment block followed by one zeroed row per live repository, in live order.
    pub fn zeroed_for(comments: Vec<String>, live: &[RepoRef]) -> Self {
        let rows = live
            .iter()
            .map(|repo| CacheRow::zeroed(RepoHash::of(repo.full_name())))
            .collect();
        Self { comments, rows }
    }

    /// Parse file contents whose first `comment_lines` lines are the legend.
    pub fn parse(text: &str, comment_lines: usize) -> Result<Self, CacheError> {
        let mut lines = text.lines();
        let comments: Vec<String> = lines
            .by_ref()
            .take(comment_lines)
            .map(str::to_string)
            .collect();

        let rows = lines
            .enumerate()
            .map(|(i, line)| CacheRow::parse(line, comment_lines + i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { comments, rows })
    }

    /// Render comment block and rows, one newline-terminated line each.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.comments {
            out.push_str(line);
            out.push('\n');
        }
        for row in &self.rows {
            out.push_str(&row.to_string());
            out.push('\n');
        }
        out
    }

    /// Reorder rows to match `live` by repository hash.
    ///
    /// Fails when the cached set of repositories differs from the live set
    /// (a repository was renamed, added or removed while the count stayed
    /// the same) or when the file holds the same hash twice.
    pub fn aligned_to(self, live: &[RepoRef]) -> Result<Self, CacheError> {
        if self.rows.len() != live.len() {
            return Err(CacheError::Inconsistent(format!(
                "{} cached rows for {} live repositories",
                self.rows.len(),
                live.len()
            )));
        }

        let mut by_hash: HashMap<RepoHash, CacheRow> = HashMap::with_capacity(self.rows.len());
        for row in self.rows {
            if let Some(previous) = by_hash.insert(row.hash.clone(), row) {
                return Err(CacheError::Inconsistent(format!(
                    "duplicate repository hash {}",
                    previous.hash
                )));
            }
        }

        let mut rows = Vec::with_capacity(live.len());
        for repo in live {
            let hash = RepoHash::of(repo.full_name());
            let row = by_hash.remove(&hash).ok_or_else(|| {
                CacheError::Inconsistent(format!("no cached row for {}", repo.key))
            })?;
            rows.push(row);
        }

        Ok(Self {
            comments: self.comments,
            rows,
        })
    }

    /// Sum of lines added across all rows.
    pub fn total_added(&self) -> u64 {
        self.rows.iter().map(|row| row.added).sum()
    }

    /// Sum of lines deleted across all rows.
    pub fn total_deleted(&self) -> u64 {
        self.rows.iter().map(|row| row.deleted).sum()
    }

    /// Sum of the tracked account's commits across all rows.
    pub fn total_my_commits(&self) -> u64 {
        self.rows.iter().map(|row| row.my_commits).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(names: &[&str]) -> Vec<RepoRef> {
        names
            .iter()
            .map(|name| RepoRef::new(name.parse().unwrap(), Some(1)))
            .collect()
    }

    fn row(name: &str, total: u64, mine: u64, added: u64, deleted: u64) -> CacheRow {
        CacheRow {
            hash: RepoHash::of(name),
            total_commits: total,
            my_commits: mine,
            added,
            deleted,
        }
    }

    #[test]
    fn legend_is_exactly_requested_length() {
        assert_eq!(legend(DEFAULT_COMMENT_LINES).len(), 7);
        assert_eq!(legend(3).len(), 3);
        assert_eq!(legend(9)[8], "");
        assert!(legend(0).is_empty());
    }

    #[test]
    fn row_uses_fixed_width_columns() {
        let line = row("octocat/hello-world", 12, 3, 450, 20).to_string();
        assert_eq!(line.len(), 64 + 1 + 5 + 1 + 5 + 1 + 10 + 1 + 10);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(&fields[1..], ["12", "3", "450", "20"]);
    }

    #[test]
    fn render_then_parse_preserves_comments_and_rows() {
        let file = CacheFile::new(
            legend(DEFAULT_COMMENT_LINES),
            vec![
                row("octocat/a", 5, 2, 100, 40),
                row("octocat/b", 1234567, 1000000, 98765432101, 7),
            ],
        );
        let parsed = CacheFile::parse(&file.render(), DEFAULT_COMMENT_LINES).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn parse_ignores_padding_width() {
        let hash = RepoHash::of("octocat/a");
        let text = format!("legend\n{} 3 1 10 2\n", hash);
        let parsed = CacheFile::parse(&text, 1).unwrap();
        assert_eq!(parsed.rows, vec![row("octocat/a", 3, 1, 10, 2)]);
    }

    #[test]
    fn parse_rejects_truncated_record() {
        let text = format!("legend\n{}\n", &RepoHash::of("octocat/a").as_str()[..20]);
        let err = CacheFile::parse(&text, 1).unwrap_err();
        assert!(matches!(err, CacheError::Malformed { line: 2, .. }));
    }

    #[test]
    fn parse_rejects_more_mine_than_total() {
        let text = format!("{} 1 2 0 0\n", RepoHash::of("octocat/a"));
        let err = CacheFile::parse(&text, 0).unwrap_err();
        assert!(matches!(err, CacheError::Malformed { line: 1, .. }));
    }

    #[test]
    fn short_file_is_all_comments() {
        let parsed = CacheFile::parse("one\ntwo\n", 7).unwrap();
        assert_eq!(parsed.comments, vec!["one", "two"]);
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn zeroed_for_follows_live_order() {
        let file = CacheFile::zeroed_for(legend(2), &live(&["octocat/b", "octocat/a"]));
        assert_eq!(
            file.rows,
            vec![
                CacheRow::zeroed(RepoHash::of("octocat/b")),
                CacheRow::zeroed(RepoHash::of("octocat/a")),
            ]
        );
    }

    #[test]
    fn aligned_to_reorders_by_hash() {
        let file = CacheFile::new(
            Vec::new(),
            vec![row("octocat/a", 1, 1, 10, 0), row("octocat/b", 2, 0, 0, 0)],
        );
        let aligned = file.aligned_to(&live(&["octocat/b", "octocat/a"])).unwrap();
        assert_eq!(aligned.rows[0].hash, RepoHash::of("octocat/b"));
        assert_eq!(aligned.rows[1].added, 10);
    }

    #[test]
    fn aligned_to_rejects_renamed_repository() {
        let file = CacheFile::new(Vec::new(), vec![row("octocat/a", 1, 1, 10, 0)]);
        let err = file.aligned_to(&live(&["octocat/renamed"])).unwrap_err();
        assert!(err.to_string().contains("octocat/renamed"));
    }

    #[test]
    fn aligned_to_rejects_duplicate_hashes() {
        let file = CacheFile::new(
            Vec::new(),
            vec![row("octocat/a", 1, 1, 10, 0), row("octocat/a", 1, 1, 10, 0)],
        );
        assert!(file.aligned_to(&live(&["octocat/a", "octocat/b"])).is_err());
    }

    #[test]
    fn totals_sum_rows() {
        let file = CacheFile::new(
            Vec::new(),
            vec![row("octocat/a", 4, 2, 100, 30), row("octocat/b", 9, 5, 7, 50)],
        );
        assert_eq!(file.total_added(), 107);
        assert_eq!(file.total_deleted(), 80);
        assert_eq!(file.total_my_commits(), 7);
    }
}
