use crate::error::MigrationError;
use engine_core::{
    connectors::{sink::BulkSink, source::DocumentSource},
    metrics::BulkStats,
    progress::ProgressCounter,
};
use engine_processing::{
    confirmer::{ConfirmSummary, SourceConfirmer},
    consumer::{
        target::{TargetReport, WriteTarget},
        writer::{DestinationWriter, WriteSummary},
    },
    producer::reader::SourceReader,
};
use std::{fmt, future::Future, path::PathBuf, sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Running => "Running",
            PipelineState::Succeeded => "Succeeded",
            PipelineState::Failed => "Failed",
            PipelineState::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::Idle | PipelineState::Running)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpReport {
    pub read: u64,
    pub written: u64,
    pub confirmed: u64,
    pub deletes_queued: u64,
    pub files: Vec<PathBuf>,
    pub output_bulk: Option<BulkStats>,
    pub input_bulk: Option<BulkStats>,
    pub elapsed: Duration,
}

/// The three stages of one run, already wired to each other.
pub struct PipelineStages {
    pub reader: SourceReader,
    pub writer: DestinationWriter,
    pub confirmer: SourceConfirmer,
}

impl PipelineStages {
    /// Connects the stages with two queues of `page_size` capacity.
    pub fn wire(
        source: Arc<dyn DocumentSource>,
        page_size: usize,
        target: WriteTarget,
        deleter: Option<Box<dyn BulkSink>>,
        progress: ProgressCounter,
        cancel: CancellationToken,
    ) -> Self {
        let (items_tx, items_rx) = mpsc::channel(page_size);
        let (confirmed_tx, confirmed_rx) = mpsc::channel(page_size);

        PipelineStages {
            reader: SourceReader::new(source, page_size, items_tx, cancel.clone()),
            writer: DestinationWriter::new(items_rx, confirmed_tx, target, cancel.clone()),
            confirmer: SourceConfirmer::new(confirmed_rx, deleter, progress, cancel),
        }
    }
}

enum StageOutput {
    Reader(usize),
    Writer(WriteSummary),
    Confirmer(ConfirmSummary),
}

/// Runs the stages as independent tasks and reports the first real failure.
///
/// A failing stage cancels the run token so the other stages unwind. Errors
/// that only say "the run was torn down" are reported when no stage failed
/// on its own, which happens when the shutdown token fires.
pub struct PipelineCoordinator {
    state: PipelineState,
    shutdown: CancellationToken,
    cancel: CancellationToken,
}

impl PipelineCoordinator {
    pub fn new(shutdown: CancellationToken) -> Self {
        let cancel = shutdown.child_token();
        Self {
            state: PipelineState::Idle,
            shutdown,
            cancel,
        }
    }

    /// Token the stages of this run must observe.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub async fn run(&mut self, stages: PipelineStages) -> Result<DumpReport, MigrationError> {
        self.transition(PipelineState::Running);
        let started = Instant::now();

        let PipelineStages {
            mut reader,
            mut writer,
            mut confirmer,
        } = stages;

        let mut set = JoinSet::new();
        set.spawn(stage("source reader", self.cancel.clone(), async move {
            reader.run().await.map(StageOutput::Reader).map_err(MigrationError::from)
        }));
        set.spawn(stage("destination writer", self.cancel.clone(), async move {
            writer.run().await.map(StageOutput::Writer).map_err(MigrationError::from)
        }));
        set.spawn(stage("source confirmer", self.cancel.clone(), async move {
            confirmer
                .run()
                .await
                .map(StageOutput::Confirmer)
                .map_err(MigrationError::from)
        }));

        let mut report = DumpReport::default();
        let mut primary: Option<MigrationError> = None;
        let mut teardown: Option<MigrationError> = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(StageOutput::Reader(read))) => report.read = read as u64,
                Ok(Ok(StageOutput::Writer(summary))) => {
                    report.written = summary.written;
                    match summary.target {
                        TargetReport::Store(stats) => report.output_bulk = Some(stats),
                        TargetReport::Files(files) => report.files = files,
                        TargetReport::None => {}
                    }
                }
                Ok(Ok(StageOutput::Confirmer(summary))) => {
                    report.confirmed = summary.confirmed;
                    report.deletes_queued = summary.deletes_queued;
                    report.input_bulk = summary.bulk;
                }
                Ok(Err(e)) if e.is_cancellation() => {
                    teardown.get_or_insert(e);
                }
                Ok(Err(e)) => {
                    primary.get_or_insert(e);
                }
                Err(e) => {
                    error!(error = %e, "Stage task failed to complete");
                    self.cancel.cancel();
                    primary.get_or_insert(MigrationError::TaskJoin(e));
                }
            }
        }
        report.elapsed = started.elapsed();

        if let Some(e) = primary {
            self.transition(PipelineState::Failed);
            return Err(e);
        }
        if self.shutdown.is_cancelled() {
            self.transition(PipelineState::Cancelled);
            return Err(MigrationError::Cancelled);
        }
        if let Some(e) = teardown {
            self.transition(PipelineState::Failed);
            return Err(e);
        }

        self.transition(PipelineState::Succeeded);
        info!(
            read = report.read,
            written = report.written,
            confirmed = report.confirmed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pipeline finished"
        );
        Ok(report)
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = %self.state, to = %next, "Pipeline state changed");
        self.state = next;
    }
}

/// Runs one stage; a failure cancels the whole run.
async fn stage<F>(
    name: &'static str,
    cancel: CancellationToken,
    fut: F,
) -> Result<StageOutput, MigrationError>
where
    F: Future<Output = Result<StageOutput, MigrationError>>,
{
    info!(stage = name, "Stage started");
    let result = fut.await;
    match &result {
        Ok(_) => info!(stage = name, "Stage finished"),
        Err(e) if e.is_cancellation() => debug!(stage = name, error = %e, "Stage stopped"),
        Err(e) => error!(stage = name, error = %e, "Stage failed"),
    }
    if result.is_err() {
        cancel.cancel();
    }
    result
}
