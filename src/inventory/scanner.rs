use super::{FileCategory, FileEntry, Inventory, SkippedFile};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "__pycache__",
    ".venv",
    "venv",
    "coverage",
];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("I/O error while scanning: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub max_files: usize,
    pub max_file_size: u64,
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 25,
            max_files: 20_000,
            max_file_size: 1024 * 1024,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }
}

/// Produces the file inventory for stage B
pub trait InventoryScanner: Send + Sync {
    fn scan(&self, workdir: &Path, config: &ScanConfig) -> Result<Inventory, ScanError>;
}

/// Gitignore-aware filesystem scanner
#[derive(Debug, Default, Clone, Copy)]
pub struct FsScanner;

impl InventoryScanner for FsScanner {
    fn scan(&self, workdir: &Path, config: &ScanConfig) -> Result<Inventory, ScanError> {
        if !workdir.exists() {
            return Err(ScanError::PathNotFound(workdir.to_path_buf()));
        }
        if !workdir.is_dir() {
            return Err(ScanError::NotADirectory(workdir.to_path_buf()));
        }

        let start = Instant::now();
        let root = workdir.canonicalize()?;

        info!(
            repo = %root.display(),
            max_depth = config.max_depth,
            max_files = config.max_files,
            "Starting inventory scan"
        );

        let mut override_builder = OverrideBuilder::new(&root);
        for excluded in &config.excluded_dirs {
            let pattern = format!("!{}/", excluded);
            override_builder
                .add(&pattern)
                .map_err(|e| ScanError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }
        let overrides = override_builder
            .build()
            .map_err(|e| ScanError::InvalidPattern {
                pattern: config.excluded_dirs.join(","),
                message: e.to_string(),
            })?;

        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for result in WalkBuilder::new(&root)
            .max_depth(Some(config.max_depth))
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .follow_links(false)
            .overrides(overrides)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            let rel_path = relative_path(&root, path);

            if files.len() >= config.max_files {
                skipped.push(SkippedFile {
                    path: rel_path,
                    reason: format!("file limit of {} reached", config.max_files),
                });
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    skipped.push(SkippedFile {
                        path: rel_path,
                        reason: format!("metadata unavailable: {}", err),
                    });
                    continue;
                }
            };

            if size > config.max_file_size {
                debug!(path = %rel_path, size, "Skipping oversized file");
                skipped.push(SkippedFile {
                    path: rel_path,
                    reason: format!("exceeds size limit of {} bytes", config.max_file_size),
                });
                continue;
            }

            let hash = match std::fs::read(path) {
                Ok(bytes) => hex::encode(Sha256::digest(&bytes)),
                Err(err) => {
                    skipped.push(SkippedFile {
                        path: rel_path,
                        reason: format!("unreadable: {}", err),
                    });
                    continue;
                }
            };

            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase();
            let category = FileCategory::classify(&rel_path);

            files.push(FileEntry {
                path: rel_path,
                size,
                extension,
                hash,
                category,
            });
        }

        let inventory = Inventory::new(root, files, skipped);

        info!(
            files = inventory.totals.files,
            skipped = inventory.skipped.len(),
            bytes = inventory.totals.bytes,
            scan_time_ms = start.elapsed().as_millis() as u64,
            "Inventory scan completed"
        );

        Ok(inventory)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
