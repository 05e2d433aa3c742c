use clap::Parser;
use engine_runtime::execution::settings::{
    DEFAULT_BULK_FLUSH_SECS, DEFAULT_BULK_SIZE_MIB, DEFAULT_SCROLL_SIZE, DumpOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "esdump",
    version,
    about = "Copy documents between Elasticsearch collections or into local files"
)]
pub struct Args {
    #[arg(long, env = "ESDUMP_DEBUG", help = "Enable debug logging")]
    pub debug: bool,

    #[arg(
        long,
        env = "ESDUMP_INPUT",
        default_value = "",
        help = "Source URL, e.g. http://localhost:9200/index-*"
    )]
    pub input: String,

    #[arg(long = "inputBasicUsername", env = "ESDUMP_INPUT_AUTH_USERNAME", default_value = "")]
    pub input_username: String,

    #[arg(long = "inputBasicPassword", env = "ESDUMP_INPUT_AUTH_PASSWORD", default_value = "")]
    pub input_password: String,

    #[arg(
        long,
        env = "ESDUMP_OUTPUT",
        default_value = "",
        help = "Destination URL or file path"
    )]
    pub output: String,

    #[arg(long = "outputBasicUsername", env = "ESDUMP_OUTPUT_AUTH_USERNAME", default_value = "")]
    pub output_username: String,

    #[arg(long = "outputBasicPassword", env = "ESDUMP_OUTPUT_AUTH_PASSWORD", default_value = "")]
    pub output_password: String,

    /// Documents per scroll page
    #[arg(long, env = "ESDUMP_SCROLL", default_value_t = DEFAULT_SCROLL_SIZE)]
    pub scroll: usize,

    /// Operations per bulk request; 0 uses the scroll size
    #[arg(long = "bulkactions", env = "ESDUMP_BULK_ACTIONS", default_value_t = 0)]
    pub bulk_actions: usize,

    /// Bulk request size in MiB
    #[arg(long = "bulksize", env = "ESDUMP_BULK_SIZE", default_value_t = DEFAULT_BULK_SIZE_MIB)]
    pub bulk_size: usize,

    /// Seconds between timed bulk flushes; 0 disables the timer
    #[arg(long = "bulkflush", env = "ESDUMP_BULK_FLUSH", default_value_t = DEFAULT_BULK_FLUSH_SECS)]
    pub bulk_flush: u64,

    #[arg(long, env = "ESDUMP_DELETE", help = "Delete source documents once copied")]
    pub delete: bool,

    #[arg(long, env = "ESDUMP_COMPRESS", help = "Gzip file output")]
    pub compress: bool,

    /// Records per output file; 0 writes a single file
    #[arg(long = "maxrows", env = "ESDUMP_MAX_ROWS", default_value_t = 0)]
    pub max_rows: u64,
}

impl Args {
    pub fn to_options(&self) -> DumpOptions {
        DumpOptions {
            input: self.input.clone(),
            input_username: self.input_username.clone(),
            input_password: self.input_password.clone(),
            output: self.output.clone(),
            output_username: self.output_username.clone(),
            output_password: self.output_password.clone(),
            scroll_size: self.scroll,
            bulk_actions: self.bulk_actions,
            bulk_size_mib: self.bulk_size,
            bulk_flush_secs: self.bulk_flush,
            delete: self.delete,
            compress: self.compress,
            max_rows: self.max_rows,
        }
    }
}
