use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

/// Last-published metadata for one source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub filename: String,
    pub public_url: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed registry file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write failed: {0}")]
    Persist(#[from] PersistError),
    #[error("registry path has no parent directory")]
    BadPath,
}

/// Durable mapping from source URL to its last-published artifact, stored as
/// one JSON object. Every upsert is read-merge-write over the whole mapping,
/// so concurrent callers must serialize (the publisher holds a lock).
///
/// Keys serialize in BTreeMap order: entries an upsert does not touch come
/// back byte-identical.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Full mapping from disk; a missing file is an empty mapping, not an
    /// error.
    pub fn load(&self) -> Result<BTreeMap<String, RegistryEntry>, RegistryError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Insert-or-replace the entry for `source_url`, stamped with now, and
    /// atomically rewrite the whole file.
    pub fn upsert(
        &self,
        source_url: &str,
        filename: String,
        public_url: String,
    ) -> Result<RegistryEntry, RegistryError> {
        let mut entries = self.load()?;
        let entry = RegistryEntry {
            filename,
            public_url,
            last_updated: Utc::now(),
        };
        entries.insert(source_url.to_string(), entry.clone());
        self.store(&entries)?;
        Ok(entry)
    }

    fn store(&self, entries: &BTreeMap<String, RegistryEntry>) -> Result<(), RegistryError> {
        let dir = self.path.parent().ok_or(RegistryError::BadPath)?;
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(RegistryError::BadPath)?;
        let json = serde_json::to_string_pretty(entries)?;
        AtomicFileWriter::new(dir.to_path_buf()).write(name, json.as_bytes())?;
        Ok(())
    }
}
