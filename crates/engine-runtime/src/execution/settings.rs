use crate::error::SettingsError;
use connectors::{elastic::client::BasicAuth, endpoint::Endpoint};
use engine_core::bulk::BulkConfig;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SCROLL_SIZE: usize = 100;
pub const DEFAULT_BULK_SIZE_MIB: usize = 2;
pub const DEFAULT_BULK_FLUSH_SECS: u64 = 30;

/// Options as given on the command line, before validation.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub input: String,
    pub input_username: String,
    pub input_password: String,
    pub output: String,
    pub output_username: String,
    pub output_password: String,
    pub scroll_size: usize,
    /// Zero means "same as the scroll size".
    pub bulk_actions: usize,
    pub bulk_size_mib: usize,
    pub bulk_flush_secs: u64,
    pub delete: bool,
    pub compress: bool,
    pub max_rows: u64,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            input_username: String::new(),
            input_password: String::new(),
            output: String::new(),
            output_username: String::new(),
            output_password: String::new(),
            scroll_size: DEFAULT_SCROLL_SIZE,
            bulk_actions: 0,
            bulk_size_mib: DEFAULT_BULK_SIZE_MIB,
            bulk_flush_secs: DEFAULT_BULK_FLUSH_SECS,
            delete: false,
            compress: false,
            max_rows: 0,
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct DumpSettings {
    pub input: Endpoint,
    pub input_auth: Option<BasicAuth>,
    pub output: Endpoint,
    pub output_auth: Option<BasicAuth>,
    /// Documents per scroll page; also the capacity of both queues.
    pub page_size: usize,
    pub bulk: BulkConfig,
    pub delete: bool,
    pub compress: bool,
    pub max_rows: u64,
}

impl DumpSettings {
    pub fn from_options(opts: &DumpOptions) -> Result<Self, SettingsError> {
        if opts.input.is_empty() {
            return Err(SettingsError::Empty("input"));
        }
        if opts.output.is_empty() {
            return Err(SettingsError::Empty("output"));
        }
        if opts.scroll_size == 0 {
            return Err(SettingsError::ZeroPageSize);
        }

        let input = Endpoint::parse(&opts.input)?;
        if input.is_file {
            return Err(SettingsError::FileInput);
        }
        let output = Endpoint::parse(&opts.output)?;

        let max_actions = match opts.bulk_actions {
            0 => opts.scroll_size,
            n => n,
        };
        let max_bytes = opts
            .bulk_size_mib
            .checked_mul(1 << 20)
            .ok_or(SettingsError::BulkSizeTooLarge(opts.bulk_size_mib))?;
        let bulk = BulkConfig::new(
            max_actions,
            max_bytes,
            Some(Duration::from_secs(opts.bulk_flush_secs)),
        );

        let settings = DumpSettings {
            input,
            input_auth: BasicAuth::from_parts(&opts.input_username, &opts.input_password),
            output,
            output_auth: BasicAuth::from_parts(&opts.output_username, &opts.output_password),
            page_size: opts.scroll_size,
            bulk,
            delete: opts.delete,
            compress: opts.compress,
            max_rows: opts.max_rows,
        };
        debug!(bulk = ?settings.bulk, page_size = settings.page_size, "Settings validated");
        Ok(settings)
    }
}
