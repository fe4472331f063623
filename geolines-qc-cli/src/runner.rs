//! CLI runner for common setup.
//!
//! Loads the configuration and initializes logging so command handlers
//! start from the same state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use geolines_qc::config::{config_file_path, ConfigFile};
use geolines_qc::geometry::PlanarEngine;
use geolines_qc::log::TracingLogger;
use geolines_qc::logging::{init_logging, LoggingGuard};
use geolines_qc::orchestrator::Orchestrator;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load `config_path` (or the default config file) and start logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.log_directory(), &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn log_path(&self) -> &Path {
        self.logging_guard.path()
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("GeoLines QC v{}", geolines_qc::VERSION);
        info!("GeoLines QC CLI: {} command", command);
    }

    /// Orchestrator using the planar engine and `tracing` for library logs.
    pub fn orchestrator(&self, config: &ConfigFile) -> Orchestrator {
        Orchestrator::from_config(config, Arc::new(PlanarEngine), Arc::new(TracingLogger))
    }
}
