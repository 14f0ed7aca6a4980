//! Repository acquisition (stage A)
//!
//! A run either analyzes a local directory in place or clones a remote repository
//! through a [`Cloner`]. The default [`GitCloner`] shells out to `git`.

mod git;

pub use git::{sanitize_tree, GitCloner, DEFAULT_CLONE_TIMEOUT};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("git is not available: {0}")]
    ToolUnavailable(String),

    #[error("Clone of {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Ref '{git_ref}' not found in {url}")]
    RefNotFound { url: String, git_ref: String },

    #[error("Clone of {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("I/O error while preparing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of stage A
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOutcome {
    pub repo_dir: PathBuf,
    pub skipped_symlinks: usize,
    pub normalized_file_count: usize,
}

impl CloneOutcome {
    /// Outcome for a directory analyzed in place
    pub fn local(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            skipped_symlinks: 0,
            normalized_file_count: 0,
        }
    }
}

/// Where the repository comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceLocation {
    Remote {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        git_ref: Option<String>,
    },
    Local { path: PathBuf },
}

impl SourceLocation {
    pub fn remote(url: impl Into<String>, git_ref: Option<String>) -> Self {
        SourceLocation::Remote {
            url: url.into(),
            git_ref,
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        SourceLocation::Local { path: path.into() }
    }

    /// Interpret a command-line source argument.
    ///
    /// Anything that looks like a URL or an scp-style `git@host:path` is remote,
    /// everything else is a local path.
    pub fn parse(source: &str, git_ref: Option<String>) -> Self {
        let looks_remote = source.contains("://")
            || (source.starts_with("git@") && source.contains(':'));
        if looks_remote && !Path::new(source).is_dir() {
            Self::remote(source, git_ref)
        } else {
            Self::local(source)
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Remote { url, git_ref: Some(r) } => write!(f, "{}@{}", url, r),
            SourceLocation::Remote { url, git_ref: None } => f.write_str(url),
            SourceLocation::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

#[async_trait]
pub trait Cloner: Send + Sync {
    /// Clone `url` at `git_ref` (default branch when `None`) somewhere below `workdir`.
    async fn clone_repo(
        &self,
        url: &str,
        git_ref: Option<&str>,
        workdir: &Path,
    ) -> Result<CloneOutcome, CloneError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        https = { "https://github.com/acme/shop.git", true },
        ssh_url = { "ssh://git@github.com/acme/shop.git", true },
        scp = { "git@github.com:acme/shop.git", true },
        relative = { "./shop", false },
        absolute = { "/srv/repos/shop", false },
    )]
    fn test_parse_source(source: &str, remote: bool) {
        let location = SourceLocation::parse(source, None);
        assert_eq!(matches!(location, SourceLocation::Remote { .. }), remote);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SourceLocation::remote("https://x/y.git", Some("v1".to_string())).to_string(),
            "https://x/y.git@v1"
        );
        assert_eq!(SourceLocation::local("/tmp/repo").to_string(), "/tmp/repo");
    }

    #[test]
    fn test_serde_shape() {
        let value = serde_json::to_value(SourceLocation::local("/tmp/repo")).unwrap();
        assert_eq!(value["kind"], "local");
        assert_eq!(value["path"], "/tmp/repo");
    }
}
