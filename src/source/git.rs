use super::{CloneError, CloneOutcome, Cloner};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

const CLONE_DIR: &str = "repo";

/// Bytes inspected when deciding whether a file is text
const BINARY_SNIFF_LEN: usize = 8000;

/// Shallow `git clone` with a timeout
#[derive(Debug, Clone)]
pub struct GitCloner {
    git: PathBuf,
    timeout: Duration,
}

impl Default for GitCloner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCloner {
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
            timeout: DEFAULT_CLONE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    async fn ensure_available(&self) -> Result<(), CloneError> {
        let output = Command::new(&self.git)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CloneError::ToolUnavailable(format!("{}: {}", self.git.display(), e)))?;
        if !output.status.success() {
            return Err(CloneError::ToolUnavailable(format!(
                "{} --version exited with {}",
                self.git.display(),
                output.status
            )));
        }
        debug!(version = %String::from_utf8_lossy(&output.stdout).trim(), "Found git");
        Ok(())
    }
}

/// Map git's stderr to the matching error kind
fn classify_failure(url: &str, git_ref: Option<&str>, stderr: &str) -> CloneError {
    let lower = stderr.to_lowercase();
    if let Some(git_ref) = git_ref {
        let missing_ref = (lower.contains("remote branch") && lower.contains("not found"))
            || lower.contains("couldn't find remote ref")
            || lower.contains("could not find remote branch");
        if missing_ref {
            return CloneError::RefNotFound {
                url: url.to_string(),
                git_ref: git_ref.to_string(),
            };
        }
    }
    CloneError::CloneFailed {
        url: url.to_string(),
        message: stderr.trim().to_string(),
    }
}

#[async_trait]
impl Cloner for GitCloner {
    async fn clone_repo(
        &self,
        url: &str,
        git_ref: Option<&str>,
        workdir: &Path,
    ) -> Result<CloneOutcome, CloneError> {
        self.ensure_available().await?;

        let target = workdir.join(CLONE_DIR);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CloneError::Io { path, source }
        };
        if target.exists() {
            debug!(path = %target.display(), "Removing stale clone");
            tokio::fs::remove_dir_all(&target).await.map_err(io_err(&target))?;
        }
        tokio::fs::create_dir_all(workdir).await.map_err(io_err(workdir))?;

        let mut command = Command::new(&self.git);
        command.args(["clone", "--depth", "1"]);
        if let Some(git_ref) = git_ref {
            command.args(["--branch", git_ref]);
        }
        command
            .arg(url)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(url, git_ref = git_ref.unwrap_or("HEAD"), "Cloning repository");
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CloneError::ToolUnavailable(e.to_string())),
            Err(_) => {
                warn!(url, timeout_secs = self.timeout.as_secs(), "Clone timed out");
                return Err(CloneError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(url, git_ref, &stderr));
        }

        let root = target.clone();
        let (skipped_symlinks, normalized_file_count) =
            tokio::task::spawn_blocking(move || sanitize_tree(&root))
                .await
                .map_err(|e| CloneError::Io {
                    path: target.clone(),
                    source: std::io::Error::other(e),
                })??;

        info!(
            path = %target.display(),
            skipped_symlinks,
            normalized_file_count,
            "Clone complete"
        );
        Ok(CloneOutcome {
            repo_dir: target,
            skipped_symlinks,
            normalized_file_count,
        })
    }

    fn name(&self) -> &str {
        "git"
    }
}

fn is_text(bytes: &[u8]) -> bool {
    !bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Remove symlinks and convert CRLF line endings to LF in text files.
///
/// Returns `(removed_symlinks, normalized_files)`. The `.git` directory is left alone.
pub fn sanitize_tree(root: &Path) -> Result<(usize, usize), CloneError> {
    let mut symlinks = 0;
    let mut normalized = 0;

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .follow_links(false)
        .filter_entry(|e| e.file_name() != ".git")
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if file_type.is_symlink() {
            std::fs::remove_file(path).map_err(|source| CloneError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "Removed symlink");
            symlinks += 1;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let bytes = std::fs::read(path).map_err(|source| CloneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !is_text(&bytes) || !bytes.windows(2).any(|w| w == b"\r\n") {
            continue;
        }

        let mut converted = Vec::with_capacity(bytes.len());
        let mut iter = bytes.iter().peekable();
        while let Some(&b) = iter.next() {
            if b == b'\r' && iter.peek() == Some(&&b'\n') {
                continue;
            }
            converted.push(b);
        }
        std::fs::write(path, converted).map_err(|source| CloneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        normalized += 1;
    }

    Ok((symlinks, normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_ref_not_found() {
        let err = classify_failure(
            "https://x/y.git",
            Some("v9"),
            "warning: Could not find remote branch v9 to clone.\nfatal: Remote branch v9 not found in upstream origin",
        );
        assert!(matches!(err, CloneError::RefNotFound { git_ref, .. } if git_ref == "v9"));
    }

    #[test]
    fn test_classify_generic_failure() {
        let err = classify_failure("https://x/y.git", None, "fatal: repository not found\n");
        match err {
            CloneError::CloneFailed { message, .. } => assert_eq!(message, "fatal: repository not found"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sanitize_normalizes_crlf() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "one\r\ntwo\r\n").unwrap();
        fs::write(temp.path().join("b.txt"), "already\nunix\n").unwrap();
        fs::write(temp.path().join("c.bin"), b"\0\r\n\0").unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/config"), "x\r\n").unwrap();

        let (symlinks, normalized) = sanitize_tree(temp.path()).unwrap();
        assert_eq!(symlinks, 0);
        assert_eq!(normalized, 1);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "one\ntwo\n");
        assert_eq!(fs::read(temp.path().join("c.bin")).unwrap(), b"\0\r\n\0");
        assert_eq!(fs::read_to_string(temp.path().join(".git/config")).unwrap(), "x\r\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_sanitize_removes_symlinks() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink("real.txt", temp.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink("/etc", temp.path().join("escape")).unwrap();

        let (symlinks, _) = sanitize_tree(temp.path()).unwrap();
        assert_eq!(symlinks, 2);
        assert!(temp.path().join("real.txt").exists());
        assert!(fs::symlink_metadata(temp.path().join("link.txt")).is_err());
    }

    #[tokio::test]
    async fn test_missing_git_binary() {
        let temp = TempDir::new().unwrap();
        let cloner = GitCloner::new().with_git_binary("/nonexistent/bin/git");
        let err = cloner
            .clone_repo("https://example.com/x.git", None, temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CloneError::ToolUnavailable(_)));
    }
}
