//! Durable LOC cache file for one account.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::CachePaths;
use super::file::{CacheFile, legend};
use crate::types::{Affiliation, RepoRef};

/// Errors returned by cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An underlying IO operation failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A record line could not be parsed, e.g. after a crash mid-write.
    #[error("malformed cache record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    /// The cached rows do not correspond to the live repositories.
    #[error("cache does not match live repositories: {0}")]
    Inconsistent(String),
    /// No cache file has been written for this account yet.
    #[error("no cache file at {0}")]
    Missing(PathBuf),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors that mean the file content cannot be trusted and
    /// should be rebuilt rather than reported.
    pub fn is_invalid_content(&self) -> bool {
        matches!(self, CacheError::Malformed { .. } | CacheError::Inconsistent(_))
    }
}

/// The cache file backing one account.
///
/// Access is single-process; concurrent runs for the same account must be
/// serialized by whoever schedules them.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    comment_lines: usize,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>, comment_lines: usize) -> Self {
        Self {
            path: path.into(),
            comment_lines,
        }
    }

    /// The store for `login` listed through `affiliations`, under `paths`.
    pub fn for_account(
        paths: &CachePaths,
        login: &str,
        affiliations: &[Affiliation],
        comment_lines: usize,
    ) -> Self {
        Self::new(paths.account_file(login, affiliations), comment_lines)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the cache file. Returns `Ok(None)` if it does not exist.
    pub fn load(&self) -> Result<Option<CacheFile>, CacheError> {
        match self.read_text()? {
            Some(text) => CacheFile::parse(&text, self.comment_lines).map(Some),
            None => Ok(None),
        }
    }

    /// Raw file contents, `None` if the file does not exist.
    ///
    /// Bytes that are not UTF-8 are reported as a malformed record at the
    /// line where decoding stopped.
    fn read_text(&self) -> Result<Option<String>, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&self.path, e)),
        };
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
                let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
                Err(CacheError::Malformed {
                    line,
                    reason: "not valid UTF-8".to_string(),
                })
            }
        }
    }

    /// Write a fresh legend and no rows.
    pub fn initialize(&self) -> Result<CacheFile, CacheError> {
        log::info!("Creating cache file {}", self.path.display());
        let file = CacheFile::new(legend(self.comment_lines), Vec::new());
        self.persist(&file)?;
        Ok(file)
    }

    /// Replace every row with a zeroed row per live repository, in live order.
    ///
    /// The existing comment block is kept when the file still has one of the
    /// expected length; otherwise a fresh legend is written.
    pub fn rebuild_from_scratch(&self, live: &[RepoRef]) -> Result<CacheFile, CacheError> {
        log::info!(
            "Rebuilding {} with {} zeroed rows",
            self.path.display(),
            live.len()
        );
        let comments = self
            .existing_comments()?
            .unwrap_or_else(|| legend(self.comment_lines));
        let file = CacheFile::zeroed_for(comments, live);
        self.persist(&file)?;
        Ok(file)
    }

    fn existing_comments(&self) -> Result<Option<Vec<String>>, CacheError> {
        let text = match self.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(None),
            Err(e) if e.is_invalid_content() => return Ok(None),
            Err(e) => return Err(e),
        };
        let comments: Vec<String> = text
            .lines()
            .take(self.comment_lines)
            .map(str::to_string)
            .collect();
        Ok((comments.len() == self.comment_lines).then_some(comments))
    }

    /// Overwrite the cache file with `file`.
    ///
    /// Content goes to a sibling temp file which is then renamed over the
    /// cache file, so readers see either the old or the new content.
    pub fn persist(&self, file: &CacheFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
            }
        }

        let temp_path = self
            .path
            .with_extension(format!("tmp.{}", std::process::id()));
        let write = || -> io::Result<()> {
            let mut out = File::create(&temp_path)?;
            out.write_all(file.render().as_bytes())?;
            out.sync_all()?;
            fs::rename(&temp_path, &self.path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&self.path, e));
        }
        log::debug!(
            "Wrote {} rows to {}",
            file.rows.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Total commits by the tracked account across every cached repository.
    pub fn total_commits(&self) -> Result<u64, CacheError> {
        match self.load()? {
            Some(file) => Ok(file.total_my_commits()),
            None => Err(CacheError::Missing(self.path.clone())),
        }
    }
}
