use std::sync::Arc;

use chrono::Utc;
use pipeline_logging::{pipeline_error, pipeline_info, pipeline_warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::extract::{Extractor, SelectorExtractor};
use crate::feed::{synthesize, FeedSettings};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::publish::Publisher;
use crate::record::build_records;
use crate::types::{
    PipelineEvent, RunSummary, SourceConfig, SourceOutcome, SourceReport, Stage, StatusSink,
};

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub fetch: FetchSettings,
    pub feed: FeedSettings,
    /// Worker-pool bound: how many source pipelines run at once.
    pub concurrency: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            feed: FeedSettings::default(),
            concurrency: 4,
        }
    }
}

/// Drives every configured source through fetch → extract → build → publish.
///
/// Sources are independent: each runs as its own task under a semaphore
/// bound, a failure is contained to its source, and cancellation abandons
/// in-flight sources while leaving already-published ones alone.
pub struct Pipeline {
    settings: RunSettings,
    publisher: Arc<Publisher>,
    sink: Arc<dyn StatusSink>,
}

impl Pipeline {
    pub fn new(settings: RunSettings, publisher: Arc<Publisher>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            settings,
            publisher,
            sink,
        }
    }

    pub async fn run(&self, sources: Vec<SourceConfig>, cancel: CancellationToken) -> RunSummary {
        let limit = self.settings.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks: JoinSet<(usize, SourceReport)> = JoinSet::new();

        for (index, source) in sources.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let settings = self.settings.clone();
            let publisher = self.publisher.clone();
            let sink = self.sink.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                sink.emit(PipelineEvent::StageChanged {
                    source_url: source.url.clone(),
                    stage: Stage::Pending,
                });
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            SourceReport {
                                url: source.url,
                                outcome: SourceOutcome::Skipped {
                                    reason: "worker pool shut down".to_string(),
                                },
                            },
                        )
                    }
                };

                let url = source.url.clone();
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => SourceOutcome::Skipped {
                        reason: "run cancelled".to_string(),
                    },
                    outcome = run_source(source, &settings, &publisher, sink.as_ref()) => outcome,
                };
                (index, SourceReport { url, outcome })
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(err) => pipeline_error!("source task panicked: {err}"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);

        let summary = RunSummary {
            reports: reports.into_iter().map(|(_, report)| report).collect(),
        };
        pipeline_info!(
            "run finished: {} published, {} skipped, {} failed",
            summary.published(),
            summary.skipped(),
            summary.failed()
        );
        summary
    }
}

/// One source's pipeline, strictly sequential. Any error is absorbed into
/// the returned outcome; nothing propagates past this function.
async fn run_source(
    source: SourceConfig,
    settings: &RunSettings,
    publisher: &Publisher,
    sink: &dyn StatusSink,
) -> SourceOutcome {
    let url = source.url.clone();
    let stage = |stage: Stage| {
        sink.emit(PipelineEvent::StageChanged {
            source_url: url.clone(),
            stage,
        });
    };

    stage(Stage::Fetching);
    let fetcher = match ReqwestFetcher::new(settings.fetch.clone()) {
        Ok(fetcher) => fetcher,
        Err(err) => return fail(sink, &url, Stage::Fetching, err.into()),
    };
    let document = match fetcher.fetch(&url).await {
        Ok(document) => document,
        Err(err) => return fail(sink, &url, Stage::Fetching, err.into()),
    };
    let fetched_at = Utc::now();

    stage(Stage::Extracting);
    let items = match SelectorExtractor.extract(&document, &source) {
        Ok(items) => items,
        Err(err) => return fail(sink, &url, Stage::Extracting, err.into()),
    };
    sink.emit(PipelineEvent::ItemsExtracted {
        source_url: url.clone(),
        count: items.len(),
    });
    if items.is_empty() {
        // Not an error: an empty feed is simply never published.
        pipeline_warn!("{url}: no elements matched any selector, skipping publish");
        stage(Stage::Done);
        return SourceOutcome::Skipped {
            reason: "no items matched the configured selectors".to_string(),
        };
    }

    stage(Stage::Building);
    let items_count = items.len();
    let records = build_records(items, fetched_at);
    let channel = match synthesize(&records, &url, &settings.feed) {
        Ok(channel) => channel,
        Err(err) => return fail(sink, &url, Stage::Building, err.into()),
    };

    stage(Stage::Publishing);
    match publisher.publish(&channel, &url).await {
        Ok(public_url) => {
            stage(Stage::Done);
            sink.emit(PipelineEvent::Published {
                source_url: url.clone(),
                public_url: public_url.clone(),
            });
            pipeline_info!("{url}: published {items_count} items at {public_url}");
            SourceOutcome::Published {
                items: items_count,
                public_url,
            }
        }
        Err(err) => fail(sink, &url, Stage::Publishing, err.into()),
    }
}

fn fail(
    sink: &dyn StatusSink,
    url: &str,
    stage: Stage,
    error: crate::types::SourceError,
) -> SourceOutcome {
    sink.emit(PipelineEvent::StageChanged {
        source_url: url.to_string(),
        stage: Stage::Failed,
    });
    pipeline_error!("{url}: {stage} failed: {error}");
    SourceOutcome::Failed { stage, error }
}
