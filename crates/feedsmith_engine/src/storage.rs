use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("store write failed: {0}")]
    Persist(#[from] PersistError),
}

/// Object-storage collaborator used by the publisher. Uploads have upsert
/// semantics: an existing object at `path` is overwritten, never duplicated.
/// Credentials and bucket lifecycle live outside the engine.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
        -> Result<(), StoreError>;

    /// Stable public reference for an uploaded object.
    fn public_url(&self, path: &str) -> String;
}

/// Directory-backed store: objects land as files under `root`, public URLs
/// are `{public_base}/{path}`. Stands in for a remote bucket in deployments
/// that serve the output directory over HTTP.
#[derive(Debug)]
pub struct DirObjectStore {
    root: PathBuf,
    public_base: String,
}

impl DirObjectStore {
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into().trim_end_matches('/').to_string();
        Self { root, public_base }
    }
}

#[async_trait::async_trait]
impl ObjectStore for DirObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StoreError> {
        AtomicFileWriter::new(self.root.clone()).write(path, bytes)?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().expect("store lock").get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.objects.lock().expect("store lock").insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}
