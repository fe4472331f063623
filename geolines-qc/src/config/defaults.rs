//! Default values for all configuration settings.

use super::settings::{AnalysisSettings, ConfigFile, LoggingSettings, MonitorSettings};
use crate::geometry::DEFAULT_ARC_SEGMENTS;
use crate::logging::DEFAULT_LOG_FILE;
use crate::stage::DEFAULT_TAG_FIELD;

/// Default buffer distance, in layer units.
pub const DEFAULT_BUFFER_DISTANCE: f64 = 500.0;

/// Default split length, in layer units.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 100.0;

/// Default progress poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            monitor: MonitorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            buffer_distance: DEFAULT_BUFFER_DISTANCE,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            tag_field: DEFAULT_TAG_FIELD.to_string(),
            split_segments: true,
            keep_intermediate_layers: false,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
