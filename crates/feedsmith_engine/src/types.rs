use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::feed::FeedError;
use crate::fetch::FetchError;
use crate::publish::PublishError;

/// One configured page to scrape plus its selection rules.
///
/// Accepts either a single `selector` or a `selectors` list in config files;
/// [`SourceConfig::rules`] presents both as one ordered rule list.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    selectors: Vec<String>,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            url: url.into(),
            selector: None,
            selectors,
        }
    }

    /// Convenience constructor for the common single-rule source.
    pub fn single(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: Some(selector.into()),
            selectors: Vec::new(),
        }
    }

    /// Selection rules in evaluation order. A bare `selector` is treated as a
    /// one-element list.
    pub fn rules(&self) -> impl Iterator<Item = &str> {
        self.selector
            .as_deref()
            .into_iter()
            .chain(self.selectors.iter().map(String::as_str))
    }
}

/// A fetched page body plus the response metadata needed to judge success.
/// Produced by one fetch and consumed once by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub html: String,
    pub status: u16,
    pub final_url: String,
}

/// One cleaned text item pulled out of a page.
///
/// Invariant: `text` is never empty or purely whitespace, and `url` is
/// absolute (the matched anchor's resolved target, or the source URL itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub text: String,
    pub url: String,
}

/// A normalized, timestamped unit of content held in a feed.
///
/// The timestamp is kept as text: feed synthesis localizes zone-less values
/// into the publication's home zone instead of assuming UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    pub url: String,
    pub timestamp: String,
}

/// Pipeline stage for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetching,
    Extracting,
    Building,
    Publishing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Building => "building",
            Stage::Publishing => "publishing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Status events emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StageChanged { source_url: String, stage: Stage },
    ItemsExtracted { source_url: String, count: usize },
    Published { source_url: String, public_url: String },
}

/// Capability handed to the orchestrator so callers choose where status
/// lines go (logger, collector in tests).
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Any failure that terminates processing of a single source. Captured at
/// the orchestrator boundary; never aborts the other sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("feed synthesis failed: {0}")]
    Feed(#[from] FeedError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Terminal state of one source's pipeline.
#[derive(Debug)]
pub enum SourceOutcome {
    /// Feed artifact written and registry updated.
    Published { items: usize, public_url: String },
    /// Nothing to publish (no matches, or the run was cancelled first).
    Skipped { reason: String },
    /// Pipeline aborted at `stage`.
    Failed { stage: Stage, error: SourceError },
}

/// Per-source result reported in the run summary.
#[derive(Debug)]
pub struct SourceReport {
    pub url: String,
    pub outcome: SourceOutcome,
}

/// Outcome of a whole run, one report per configured source, in input order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
}

impl RunSummary {
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, SourceOutcome::Published { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SourceOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SourceOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&SourceOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}
