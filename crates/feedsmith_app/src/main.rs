mod config;
mod logging;

use std::path::Path;
use std::sync::Arc;

use pipeline_logging::{pipeline_debug, pipeline_info, pipeline_warn};
use tokio_util::sync::CancellationToken;

use feedsmith_engine::{
    DirObjectStore, ObjectStore, Pipeline, PipelineEvent, Publisher, Registry, SourceOutcome,
    StatusSink,
};

use crate::config::AppConfig;

/// Forwards pipeline status events to the global logger.
struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageChanged { source_url, stage } => {
                pipeline_debug!("{source_url}: {stage}");
            }
            PipelineEvent::ItemsExtracted { source_url, count } => {
                pipeline_info!("{source_url}: {count} items extracted");
            }
            PipelineEvent::Published {
                source_url,
                public_url,
            } => {
                pipeline_info!("{source_url}: feed available at {public_url}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize(logging::LogDestination::Terminal);

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "feedsmith.json".to_string());
    let config = AppConfig::load(Path::new(&config_path))?;
    let settings = config.run_settings()?;
    let sources = config.valid_sources();

    let store: Option<Arc<dyn ObjectStore>> = config.storage.as_ref().map(|storage| {
        Arc::new(DirObjectStore::new(
            storage.root.clone(),
            storage.public_base.clone(),
        )) as Arc<dyn ObjectStore>
    });
    let registry = Registry::new(config.registry_path.clone());
    let publisher = Arc::new(Publisher::new(config.output_dir.clone(), store, registry));
    let pipeline = Pipeline::new(settings, publisher, Arc::new(LogStatusSink));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            pipeline_warn!("interrupt received, abandoning in-flight sources");
            signal_cancel.cancel();
        }
    });

    pipeline_info!("starting run over {} sources", sources.len());
    let summary = pipeline.run(sources, cancel).await;

    for report in &summary.reports {
        match &report.outcome {
            SourceOutcome::Published { items, public_url } => {
                println!("{}: published {items} items -> {public_url}", report.url);
            }
            SourceOutcome::Skipped { reason } => {
                println!("{}: skipped ({reason})", report.url);
            }
            SourceOutcome::Failed { stage, error } => {
                println!("{}: failed at {stage}: {error}", report.url);
            }
        }
    }
    println!(
        "{} published, {} skipped, {} failed",
        summary.published(),
        summary.skipped(),
        summary.failed()
    );

    Ok(())
}
