use crate::{error::MigrationError, execution::settings::DumpSettings};
use connectors::{
    elastic::client::ElasticClient,
    file::sink::{FileSink, FileSinkConfig},
};
use engine_core::{
    bulk::BulkProcessor,
    connectors::{elastic::ElasticSource, sink::BulkSink, source::DocumentSource},
};
use engine_processing::consumer::target::WriteTarget;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Name of the batching writer toward the destination store.
pub const OUTPUT_PROCESSOR: &str = "esdump-output";
/// Name of the batching writer deleting from the source store.
pub const INPUT_PROCESSOR: &str = "esdump-input";

fn input_client(settings: &DumpSettings) -> Result<ElasticClient, MigrationError> {
    Ok(ElasticClient::new(
        &settings.input.url,
        settings.input_auth.clone(),
    )?)
}

pub fn create_source(settings: &DumpSettings) -> Result<Arc<dyn DocumentSource>, MigrationError> {
    let source = ElasticSource::new(input_client(settings)?, settings.input.collection.clone());
    Ok(Arc::new(source))
}

/// Output file or destination store batch. Must run inside a tokio runtime.
///
/// Bulk requests toward the store are abandoned once `cancel` fires.
pub fn create_target(
    settings: &DumpSettings,
    cancel: &CancellationToken,
) -> Result<WriteTarget, MigrationError> {
    let output = &settings.output;

    if output.is_file {
        let config = FileSinkConfig::new(&output.collection)
            .compress(settings.compress)
            .max_rows(settings.max_rows);
        info!(file = %config.file_name(0).display(), "Writing to file");
        return Ok(WriteTarget::File(FileSink::create(config)?));
    }

    let client = ElasticClient::new(&output.url, settings.output_auth.clone())?;
    let processor = BulkProcessor::start(
        OUTPUT_PROCESSOR,
        client,
        settings.bulk.clone(),
        cancel.clone(),
    );
    info!(endpoint = %output.url, collection = %output.collection, "Writing to store");
    Ok(WriteTarget::store(Box::new(processor), output.collection.clone()))
}

/// Source-side delete batch, only when deletion is enabled.
pub fn create_deleter(
    settings: &DumpSettings,
    cancel: &CancellationToken,
) -> Result<Option<Box<dyn BulkSink>>, MigrationError> {
    if !settings.delete {
        return Ok(None);
    }
    let processor = BulkProcessor::start(
        INPUT_PROCESSOR,
        input_client(settings)?,
        settings.bulk.clone(),
        cancel.clone(),
    );
    Ok(Some(Box::new(processor)))
}
