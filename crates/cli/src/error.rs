use engine_runtime::error::{MigrationError, SettingsError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid options: {0}")]
    Options(#[from] SettingsError),

    #[error("Failed to run the dump: {0}")]
    Runner(#[from] MigrationError),
}

impl CliError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, CliError::Runner(MigrationError::Cancelled))
    }
}
