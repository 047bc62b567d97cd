//! Feedsmith engine: the scrape-and-republish pipeline.
//!
//! Fetches configured pages, extracts items by CSS selector, synthesizes one
//! RSS feed per source and publishes it, tracking each publication in a
//! durable registry.
mod extract;
mod feed;
mod fetch;
mod filename;
mod orchestrate;
mod persist;
mod publish;
mod record;
mod registry;
mod storage;
mod types;

pub use extract::{ExtractError, Extractor, SelectorExtractor};
pub use feed::{synthesize, FeedError, FeedSettings};
pub use fetch::{FetchError, FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::feed_filename;
pub use orchestrate::{Pipeline, RunSettings};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use publish::{PublishError, Publisher, FEED_CONTENT_TYPE};
pub use record::build_records;
pub use registry::{Registry, RegistryEntry, RegistryError};
pub use storage::{DirObjectStore, MemoryObjectStore, ObjectStore, StoreError, StoredObject};
pub use types::{
    ExtractedItem, PipelineEvent, RawDocument, Record, RunSummary, SourceConfig, SourceError,
    SourceOutcome, SourceReport, Stage, StatusSink,
};
