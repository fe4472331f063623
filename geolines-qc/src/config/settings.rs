//! Configuration structs, one per INI section.

use std::path::PathBuf;
use std::time::Duration;

use crate::logging::default_log_dir;
use crate::task::TaskOptions;

/// Contents of `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub analysis: AnalysisSettings,
    pub monitor: MonitorSettings,
    pub logging: LoggingSettings,
}

/// `[analysis]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Buffer distance used by the tag stage, in layer units.
    pub buffer_distance: f64,
    /// Target segment length for the split stage, in layer units.
    pub segment_length: f64,
    /// Buffer arc segments per quarter circle.
    pub arc_segments: u32,
    /// Boolean field written by the tag stage.
    pub tag_field: String,
    /// Run the split stage.
    pub split_segments: bool,
    /// Return every stage's output alongside the result.
    pub keep_intermediate_layers: bool,
}

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub poll_interval_ms: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory; platform data directory when unset.
    pub directory: Option<PathBuf>,
    pub file: String,
}

impl ConfigFile {
    /// Task options derived from `[analysis]`.
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            keep_intermediate_layers: self.analysis.keep_intermediate_layers,
            arc_segments: self.analysis.arc_segments,
            tag_field: self.analysis.tag_field.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.poll_interval_ms)
    }

    /// Effective log directory.
    pub fn log_directory(&self) -> PathBuf {
        self.logging
            .directory
            .clone()
            .unwrap_or_else(default_log_dir)
    }
}
