use crate::{
    error::MigrationError,
    execution::coordinator::{PipelineCoordinator, PipelineStages, PipelineState},
};
use async_trait::async_trait;
use engine_core::{
    connectors::{sink::BulkSink, source::DocumentSource},
    error::{SinkError, SourceError},
    metrics::BulkStats,
    progress::ProgressCounter,
};
use engine_processing::{
    consumer::target::WriteTarget,
    error::{ConsumerError, ProducerError},
};
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::{batch::BulkOperation, document::Document},
};
use serde_json::json;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn docs(collection: &str, ids: std::ops::Range<usize>) -> Vec<Document> {
    ids.map(|i| Document::from_value(collection, &i.to_string(), &json!({ "n": i })).unwrap())
        .collect()
}

enum PageBehavior {
    Serve(Vec<Document>),
    Fail,
    Hang,
    Panic,
}

struct ScriptedSource {
    pages: Vec<PageBehavior>,
    /// Documents handed out so far.
    served: Arc<AtomicUsize>,
}

#[async_trait]
impl DocumentSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _page_size: usize, cursor: Cursor) -> Result<FetchResult, SourceError> {
        let index: usize = match &cursor {
            Cursor::None => 0,
            Cursor::Scroll { id } => id.parse().unwrap(),
        };
        match self.pages.get(index) {
            None => Ok(FetchResult::end()),
            Some(PageBehavior::Serve(docs)) => {
                self.served.fetch_add(docs.len(), Ordering::SeqCst);
                Ok(FetchResult::page(
                    docs.clone(),
                    Cursor::scroll((index + 1).to_string()),
                ))
            }
            Some(PageBehavior::Fail) => Err(SourceError::Fetch("connection reset".into())),
            Some(PageBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some(PageBehavior::Panic) => panic!("source blew up"),
        }
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(0)
    }
}

#[derive(Clone, Default)]
struct MemorySink {
    ops: Arc<Mutex<Vec<BulkOperation>>>,
    reject_at: Option<usize>,
}

#[async_trait]
impl BulkSink for MemorySink {
    async fn add(&mut self, op: BulkOperation) -> Result<(), SinkError> {
        let mut ops = self.ops.lock().unwrap();
        if self.reject_at == Some(ops.len()) {
            return Err(SinkError::Rejected("destination unavailable".into()));
        }
        ops.push(op);
        Ok(())
    }

    async fn close(&mut self) -> Result<BulkStats, SinkError> {
        let n = self.ops.lock().unwrap().len() as u64;
        Ok(BulkStats {
            queued: n,
            requests: 1,
            bytes_sent: 0,
            succeeded: n,
            failed: 0,
        })
    }
}

fn stages(
    coordinator: &PipelineCoordinator,
    pages: Vec<PageBehavior>,
    output: MemorySink,
    deleter: Option<MemorySink>,
    progress: ProgressCounter,
) -> PipelineStages {
    PipelineStages::wire(
        Arc::new(ScriptedSource {
            pages,
            served: Arc::default(),
        }),
        2,
        WriteTarget::store(Box::new(output), ""),
        deleter.map(|d| Box::new(d) as Box<dyn BulkSink>),
        progress,
        coordinator.cancel_token(),
    )
}

#[traced_test]
#[tokio::test]
async fn copies_confirms_and_deletes_everything() {
    let output = MemorySink::default();
    let deleter = MemorySink::default();
    let progress = ProgressCounter::hidden();
    let handle = progress.handle();

    let mut coordinator = PipelineCoordinator::new(CancellationToken::new());
    assert_eq!(coordinator.state(), PipelineState::Idle);

    let pipeline = stages(
        &coordinator,
        vec![
            PageBehavior::Serve(docs("logs", 0..2)),
            PageBehavior::Serve(docs("logs", 2..4)),
            PageBehavior::Serve(docs("logs", 4..5)),
        ],
        output.clone(),
        Some(deleter.clone()),
        progress,
    );
    let report = coordinator.run(pipeline).await.unwrap();

    assert_eq!(coordinator.state(), PipelineState::Succeeded);
    assert_eq!(report.read, 5);
    assert_eq!(report.written, 5);
    assert_eq!(report.confirmed, 5);
    assert_eq!(report.deletes_queued, 5);
    assert_eq!(report.output_bulk.map(|s| s.succeeded), Some(5));
    assert_eq!(report.input_bulk.map(|s| s.succeeded), Some(5));
    assert_eq!(handle.confirmed(), 5);

    let written: Vec<_> = output
        .ops
        .lock()
        .unwrap()
        .iter()
        .map(|op| op.id().to_string())
        .collect();
    assert_eq!(written, vec!["0", "1", "2", "3", "4"]);
    assert!(
        deleter
            .ops
            .lock()
            .unwrap()
            .iter()
            .all(|op| op.action() == "delete")
    );
    assert!(logs_contain("to=Running"));
    assert!(logs_contain("to=Succeeded"));
}

#[tokio::test]
async fn writer_failure_wins_over_cancelled_peers() {
    let output = MemorySink {
        reject_at: Some(3),
        ..Default::default()
    };
    let progress = ProgressCounter::hidden();
    let handle = progress.handle();

    let mut coordinator = PipelineCoordinator::new(CancellationToken::new());
    let pipeline = stages(
        &coordinator,
        (0..50)
            .map(|p| PageBehavior::Serve(docs("logs", p * 2..p * 2 + 2)))
            .collect(),
        output,
        None,
        progress,
    );

    let err = coordinator.run(pipeline).await.unwrap_err();
    assert!(
        matches!(
            err,
            MigrationError::Consumer(ConsumerError::Sink(SinkError::Rejected(_)))
        ),
        "unexpected error: {err}"
    );
    assert_eq!(coordinator.state(), PipelineState::Failed);
    assert!(coordinator.cancel_token().is_cancelled());
    assert!(handle.confirmed() <= 3);
}

#[tokio::test]
async fn writer_failure_stops_reading_within_queue_capacity() {
    const PAGE_SIZE: usize = 2;
    const REJECT_AT: usize = 3;

    let served = Arc::new(AtomicUsize::new(0));
    let source = ScriptedSource {
        pages: (0..100)
            .map(|p| PageBehavior::Serve(docs("logs", p * PAGE_SIZE..(p + 1) * PAGE_SIZE)))
            .collect(),
        served: served.clone(),
    };
    let output = MemorySink {
        reject_at: Some(REJECT_AT),
        ..Default::default()
    };

    let mut coordinator = PipelineCoordinator::new(CancellationToken::new());
    let pipeline = PipelineStages::wire(
        Arc::new(source),
        PAGE_SIZE,
        WriteTarget::store(Box::new(output), ""),
        None,
        ProgressCounter::hidden(),
        coordinator.cancel_token(),
    );
    assert!(coordinator.run(pipeline).await.is_err());

    // Taken by the writer, waiting in the item queue, or held by the reader.
    let bound = (REJECT_AT + 1) + PAGE_SIZE + PAGE_SIZE;
    let served = served.load(Ordering::SeqCst);
    assert!(served <= bound, "read {served} documents, expected at most {bound}");
}

#[tokio::test]
async fn fetch_failure_is_reported() {
    let mut coordinator = PipelineCoordinator::new(CancellationToken::new());
    let pipeline = stages(
        &coordinator,
        vec![PageBehavior::Serve(docs("logs", 0..2)), PageBehavior::Fail],
        MemorySink::default(),
        None,
        ProgressCounter::hidden(),
    );

    let err = coordinator.run(pipeline).await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Producer(ProducerError::Fetch { .. })
    ));
    assert_eq!(coordinator.state(), PipelineState::Failed);
}

#[tokio::test]
async fn operator_interrupt_reports_cancelled() {
    let shutdown = CancellationToken::new();
    let mut coordinator = PipelineCoordinator::new(shutdown.clone());
    let pipeline = stages(
        &coordinator,
        vec![PageBehavior::Serve(docs("logs", 0..2)), PageBehavior::Hang],
        MemorySink::default(),
        None,
        ProgressCounter::hidden(),
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), coordinator.run(pipeline))
        .await
        .expect("pipeline must unwind after interrupt");
    assert!(matches!(result, Err(MigrationError::Cancelled)));
    assert_eq!(coordinator.state(), PipelineState::Cancelled);
}

#[tokio::test]
async fn panicking_stage_fails_the_run() {
    let mut coordinator = PipelineCoordinator::new(CancellationToken::new());
    let pipeline = stages(
        &coordinator,
        vec![PageBehavior::Serve(docs("logs", 0..2)), PageBehavior::Panic],
        MemorySink::default(),
        None,
        ProgressCounter::hidden(),
    );

    let err = coordinator.run(pipeline).await.unwrap_err();
    assert!(matches!(err, MigrationError::TaskJoin(_)));
    assert_eq!(coordinator.state(), PipelineState::Failed);
}

#[test]
fn terminal_states() {
    assert!(!PipelineState::Idle.is_terminal());
    assert!(!PipelineState::Running.is_terminal());
    assert!(PipelineState::Succeeded.is_terminal());
    assert!(PipelineState::Failed.is_terminal());
    assert!(PipelineState::Cancelled.is_terminal());
}
