use crate::{
    error::MigrationError,
    execution::{
        coordinator::{DumpReport, PipelineCoordinator, PipelineStages},
        factory,
        settings::DumpSettings,
    },
};
use engine_core::{
    connectors::{sink::BulkSink, source::DocumentSource},
    progress::ProgressCounter,
};
use engine_processing::consumer::target::WriteTarget;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs one dump: count, then read, write and confirm until the source is
/// exhausted or the first stage fails.
pub async fn run(
    settings: DumpSettings,
    shutdown: CancellationToken,
) -> Result<DumpReport, MigrationError> {
    info!(
        input = %settings.input.url,
        collection = %settings.input.collection,
        delete = settings.delete,
        "Starting dump"
    );

    let source = factory::create_source(&settings)?;
    let total = count_documents(source.as_ref(), &shutdown).await?;
    info!(total, "Documents to dump");

    let progress = ProgressCounter::for_terminal(Some(total));
    let mut coordinator = PipelineCoordinator::new(shutdown);
    let cancel = coordinator.cancel_token();
    let target = factory::create_target(&settings, &cancel)?;
    let deleter = factory::create_deleter(&settings, &cancel)?;

    let stages = PipelineStages::wire(
        source,
        settings.page_size,
        target,
        deleter,
        progress,
        cancel,
    );
    coordinator.run(stages).await
}

/// Wires the stages around the given collaborators and runs them to completion.
pub async fn run_pipeline(
    source: Arc<dyn DocumentSource>,
    page_size: usize,
    target: WriteTarget,
    deleter: Option<Box<dyn BulkSink>>,
    progress: ProgressCounter,
    shutdown: CancellationToken,
) -> Result<DumpReport, MigrationError> {
    let mut coordinator = PipelineCoordinator::new(shutdown);
    let stages = PipelineStages::wire(
        source,
        page_size,
        target,
        deleter,
        progress,
        coordinator.cancel_token(),
    );
    coordinator.run(stages).await
}

async fn count_documents(
    source: &dyn DocumentSource,
    shutdown: &CancellationToken,
) -> Result<u64, MigrationError> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(MigrationError::Cancelled),
        count = source.count() => Ok(count?),
    }
}
