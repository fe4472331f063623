//! INI serialization: [`ConfigFile`] → commented INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let directory = config
        .logging
        .directory
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[analysis]
; Buffer distance used when tagging segments, in layer units (default: 500)
buffer_distance = {}
; Length of the segments produced by the split stage, in layer units (default: 100)
segment_length = {}
; Buffer arc segments per quarter circle (default: 5)
arc_segments = {}
; Boolean field set on every output feature (default: intersects)
tag_field = {}
; Split input lines into segments before tagging (default: true)
split_segments = {}
; Also write the output of every intermediate stage (default: false)
keep_intermediate_layers = {}

[monitor]
; Progress poll interval in milliseconds (default: 100)
poll_interval_ms = {}

[logging]
; Log directory. If empty, defaults to the platform data directory
; (e.g. ~/.local/share/geolines-qc/logs on Linux)
directory = {}
; Log file name inside the log directory; lines are appended
file = {}
"#,
        config.analysis.buffer_distance,
        config.analysis.segment_length,
        config.analysis.arc_segments,
        config.analysis.tag_field,
        config.analysis.split_segments,
        config.analysis.keep_intermediate_layers,
        config.monitor.poll_interval_ms,
        directory,
        config.logging.file,
    )
}
