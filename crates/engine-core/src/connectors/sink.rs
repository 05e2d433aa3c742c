use crate::{error::SinkError, metrics::BulkStats};
use async_trait::async_trait;
use model::records::batch::BulkOperation;

/// A batching writer toward a store.
///
/// `add` only guarantees the operation was accepted into the batch; it is
/// durable once a flush covering it succeeds. `close` flushes what is left.
#[async_trait]
pub trait BulkSink: Send {
    async fn add(&mut self, op: BulkOperation) -> Result<(), SinkError>;

    async fn close(&mut self) -> Result<BulkStats, SinkError>;
}
