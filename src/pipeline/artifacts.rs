//! JSON stage artifacts under `<output>/.specmine/`

use crate::util::write_atomic;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CLONE: &str = "clone.json";
pub const INVENTORY: &str = "inventory.json";
pub const STACK_PROFILE: &str = "stack_profile.json";
pub const SURFACES: &str = "surfaces.json";
pub const ENRICHMENT: &str = "enrichment.json";
pub const TRACEABILITY: &str = "traceability.json";
pub const DOCUMENTS: &str = "documents.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact {name} is missing at {path}; re-run without --resume")]
    Missing { name: String, path: PathBuf },

    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Artifact {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode artifact {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), ArtifactError> {
        save_json(&self.path(name), value)
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArtifactError> {
        load_json(&self.path(name), name)
    }
}

pub(crate) fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, &json).map_err(|e| ArtifactError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = json.len(), "Wrote artifact");
    Ok(())
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path, name: &str) -> Result<T, ArtifactError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(ArtifactError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A stage output that is either produced in this run or read back from its
/// artifact the first time a later stage asks for it.
#[derive(Debug)]
pub struct Lazy<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T: DeserializeOwned> Lazy<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    pub fn get(&mut self, store: &ArtifactStore) -> Result<&T, ArtifactError> {
        if self.value.is_none() {
            debug!(artifact = self.name, "Loading artifact from previous run");
            self.value = Some(store.load(self.name)?);
        }
        match &self.value {
            Some(value) => Ok(value),
            None => Err(ArtifactError::Missing {
                name: self.name.to_string(),
                path: store.path(self.name),
            }),
        }
    }

    pub fn set(&mut self, value: T) -> &T {
        self.value.insert(value)
    }

    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }
}
