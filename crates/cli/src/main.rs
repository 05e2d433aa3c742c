use crate::{args::Args, error::CliError};
use clap::Parser;
use engine_runtime::{
    execution::{coordinator::DumpReport, executor, settings::DumpSettings},
    shutdown::{ExitCode, ShutdownCoordinator},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod args;
mod error;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(&args, shutdown.cancel_token()).await {
        Ok(report) => {
            log_report(&report);
            ExitCode::Success
        }
        Err(e) if e.is_shutdown() || shutdown.is_shutdown_requested() => {
            warn!(error = %e, "Dump interrupted, partial output is kept");
            ExitCode::GeneralError
        }
        Err(e) => {
            error!(error = %e, "Dump failed");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(args: &Args, cancel: CancellationToken) -> Result<DumpReport, CliError> {
    let settings = DumpSettings::from_options(&args.to_options())?;
    Ok(executor::run(settings, cancel).await?)
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_report(report: &DumpReport) {
    info!(
        read = report.read,
        written = report.written,
        confirmed = report.confirmed,
        deleted = report.deletes_queued,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Dump completed"
    );
    for file in &report.files {
        info!(file = %file.display(), "Wrote file");
    }
    if let Some(stats) = report.output_bulk {
        info!(
            requests = stats.requests,
            bytes = stats.bytes_sent,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Destination bulk statistics"
        );
    }
    if let Some(stats) = report.input_bulk {
        info!(
            requests = stats.requests,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Source delete statistics"
        );
    }
}
