//! File inventory of a checked-out repository

mod scanner;

pub use scanner::{FsScanner, InventoryScanner, ScanConfig, ScanError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Source,
    Config,
    Test,
    Asset,
    Documentation,
    Migration,
}

impl FileCategory {
    /// Classify a repository-relative path. Order matters: a migration under
    /// `db/migrate` is a migration even though it is also source.
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase();
        let file_name = lower.rsplit('/').next().unwrap_or(&lower);
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");

        if lower.contains("migrations/") || lower.contains("migrate/") || lower.contains("alembic/")
        {
            return FileCategory::Migration;
        }

        if lower.starts_with("test/")
            || lower.starts_with("tests/")
            || lower.contains("/test/")
            || lower.contains("/tests/")
            || lower.contains("__tests__/")
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
            || file_name.starts_with("test_")
            || file_name.ends_with("_test.go")
            || file_name.ends_with("_test.py")
        {
            return FileCategory::Test;
        }

        if file_name.starts_with("requirements") && extension == "txt" {
            return FileCategory::Config;
        }

        match extension {
            "md" | "mdx" | "rst" | "adoc" | "txt" => return FileCategory::Documentation,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" | "woff" | "woff2" | "ttf"
            | "eot" | "mp4" | "mp3" | "pdf" => return FileCategory::Asset,
            _ => {}
        }

        if file_name.starts_with(".env")
            || matches!(
                extension,
                "json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "conf" | "lock" | "xml"
            )
            || file_name.contains(".config.")
            || file_name == "dockerfile"
            || file_name == "makefile"
        {
            return FileCategory::Config;
        }

        FileCategory::Source
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCategory::Source => "source",
            FileCategory::Config => "config",
            FileCategory::Test => "test",
            FileCategory::Asset => "asset",
            FileCategory::Documentation => "documentation",
            FileCategory::Migration => "migration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the inventory root, always `/`-separated
    pub path: String,
    pub size: u64,
    pub extension: String,
    pub hash: String,
    pub category: FileCategory,
}

impl FileEntry {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTotals {
    pub files: usize,
    pub bytes: u64,
    pub by_category: BTreeMap<FileCategory, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub root: PathBuf,
    pub files: Vec<FileEntry>,
    pub skipped: Vec<SkippedFile>,
    pub totals: InventoryTotals,
}

impl Inventory {
    pub fn new(root: PathBuf, files: Vec<FileEntry>, skipped: Vec<SkippedFile>) -> Self {
        let mut totals = InventoryTotals::default();
        for file in &files {
            totals.files += 1;
            totals.bytes += file.size;
            *totals.by_category.entry(file.category).or_insert(0) += 1;
        }
        Self {
            root,
            files,
            skipped,
            totals,
        }
    }

    pub fn empty(root: PathBuf) -> Self {
        Self::new(root, Vec::new(), Vec::new())
    }

    pub fn find(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Files whose base name equals `name`, at any depth
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileEntry> + 'a {
        self.files.iter().filter(move |f| f.file_name() == name)
    }

    pub fn files_in(&self, category: FileCategory) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(move |f| f.category == category)
    }
}

#[cfg(test)]
pub(crate) fn entry(path: &str) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        size: 10,
        extension: path.rsplit_once('.').map(|(_, e)| e.to_string()).unwrap_or_default(),
        hash: String::new(),
        category: FileCategory::classify(path),
    }
}
