#![allow(dead_code)]

use engine_core::{connectors::sink::BulkSink, progress::ProgressCounter};
use engine_processing::consumer::target::WriteTarget;
use engine_runtime::{
    error::MigrationError,
    execution::{coordinator::DumpReport, executor::run_pipeline},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utils::{MemorySink, MemoryStore};

pub mod utils;

/// Page size used by the in-memory pipelines unless a test says otherwise.
const PAGE_SIZE: usize = 10;

/// Copies `from` into the store behind `target`, optionally deleting from `from`.
async fn dump_memory(
    store: &MemoryStore,
    from: &str,
    target: WriteTarget,
    delete: bool,
    progress: ProgressCounter,
) -> Result<DumpReport, MigrationError> {
    let deleter = delete.then(|| Box::new(store.sink()) as Box<dyn BulkSink>);
    run_pipeline(
        Arc::new(store.source(from)),
        PAGE_SIZE,
        target,
        deleter,
        progress,
        CancellationToken::new(),
    )
    .await
}

fn store_target(sink: MemorySink, collection: &str) -> WriteTarget {
    WriteTarget::store(Box::new(sink), collection)
}
