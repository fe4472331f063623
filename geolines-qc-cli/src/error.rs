//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes:
//! - 1: the analysis ran and failed
//! - 2: bad arguments, configuration or files
//! - 130: the analysis was cancelled

use std::fmt;
use std::path::PathBuf;
use std::process;

use geolines_qc::config::ConfigFileError;
use geolines_qc::io::GeoJsonError;
use geolines_qc::orchestrator::SubmitError;
use geolines_qc::task::TaskError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file error
    Config(ConfigFileError),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Failed to read an input layer
    Input { path: PathBuf, error: GeoJsonError },
    /// Failed to write an output layer
    Output { path: PathBuf, error: GeoJsonError },
    /// Request rejected or worker not started
    Submit(SubmitError),
    /// The analysis failed
    Analysis(TaskError),
    /// The analysis was cancelled
    Cancelled(String),
    /// Failed to install the Ctrl+C handler
    SignalHandler(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Analysis(_) => 1,
            CliError::Cancelled(_) => 130,
            _ => 2,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Submit(SubmitError::Validation(_)) => {
                eprintln!();
                eprintln!("Check --buffer, --segment-length and --extract-within,");
                eprintln!("and that all layers share the input layer's CRS.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'geolines-qc config init --force' to restore a default config file.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Input { path, error } => {
                write!(f, "Failed to read layer '{}': {}", path.display(), error)
            }
            CliError::Output { path, error } => {
                write!(f, "Failed to write layer '{}': {}", path.display(), error)
            }
            CliError::Submit(e) => write!(f, "Analysis not started: {}", e),
            CliError::Analysis(e) => write!(f, "Analysis failed: {}", e),
            CliError::Cancelled(msg) => write!(f, "{}", msg),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Input { error, .. } => Some(error),
            CliError::Output { error, .. } => Some(error),
            CliError::Submit(e) => Some(e),
            CliError::Analysis(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<SubmitError> for CliError {
    fn from(e: SubmitError) -> Self {
        CliError::Submit(e)
    }
}
