use std::path::PathBuf;
use std::sync::Arc;

use rss::Channel;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::filename::feed_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::registry::{Registry, RegistryError};
use crate::storage::{ObjectStore, StoreError};

pub const FEED_CONTENT_TYPE: &str = "application/rss+xml";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("local write failed: {0}")]
    Persist(#[from] PersistError),
    #[error("remote upload failed: {0}")]
    Store(#[from] StoreError),
    #[error("registry update failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("no publish destination configured")]
    NoDestination,
}

/// Writes feed artifacts to their destinations and records each publication
/// in the registry.
///
/// Not transactional: local write, upload and registry update are independent
/// steps and completed ones are not rolled back on a later failure. Every
/// step is idempotent under the derived filename, so the next run self-heals
/// a partial failure.
pub struct Publisher {
    local_dir: Option<PathBuf>,
    store: Option<Arc<dyn ObjectStore>>,
    // The registry upsert is read-modify-write over the whole mapping;
    // concurrent publishes must not interleave it.
    registry: Mutex<Registry>,
}

impl Publisher {
    pub fn new(
        local_dir: Option<PathBuf>,
        store: Option<Arc<dyn ObjectStore>>,
        registry: Registry,
    ) -> Self {
        Self {
            local_dir,
            store,
            registry: Mutex::new(registry),
        }
    }

    /// Serialize the feed, write/upload it under its derived name and upsert
    /// the registry entry for `source_url`. Returns the public reference.
    pub async fn publish(&self, channel: &Channel, source_url: &str) -> Result<String, PublishError> {
        let bytes = channel.to_string().into_bytes();
        let filename = feed_filename(source_url);

        let mut public_url = None;
        if let Some(dir) = &self.local_dir {
            let path = AtomicFileWriter::new(dir.clone()).write(&filename, &bytes)?;
            public_url = Some(path.display().to_string());
        }
        if let Some(store) = &self.store {
            store.upload(&filename, &bytes, FEED_CONTENT_TYPE).await?;
            public_url = Some(store.public_url(&filename));
        }
        let public_url = public_url.ok_or(PublishError::NoDestination)?;

        let registry = self.registry.lock().await;
        registry.upsert(source_url, filename, public_url.clone())?;
        drop(registry);

        Ok(public_url)
    }
}
