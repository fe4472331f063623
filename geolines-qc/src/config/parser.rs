//! INI parsing: `Ini` → [`ConfigFile`].
//!
//! The single place where INI key names map to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [analysis] section
    if let Some(section) = ini.section(Some("analysis")) {
        let keys = SectionReader::new("analysis", section);
        if let Some(v) = keys.get("buffer_distance") {
            config.analysis.buffer_distance = keys.number(
                "buffer_distance",
                v,
                |d| d >= 0.0,
                "must be a non-negative number",
            )?;
        }
        if let Some(v) = keys.get("segment_length") {
            config.analysis.segment_length = keys.number(
                "segment_length",
                v,
                |d| d > 0.0,
                "must be a positive number",
            )?;
        }
        if let Some(v) = keys.get("arc_segments") {
            config.analysis.arc_segments = match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(keys.invalid("arc_segments", v, "must be a positive integer")),
            };
        }
        if let Some(v) = keys.get("tag_field") {
            if v.is_empty() {
                return Err(keys.invalid("tag_field", v, "must not be empty"));
            }
            config.analysis.tag_field = v.to_string();
        }
        if let Some(v) = keys.get("split_segments") {
            config.analysis.split_segments = keys.boolean("split_segments", v)?;
        }
        if let Some(v) = keys.get("keep_intermediate_layers") {
            config.analysis.keep_intermediate_layers = keys.boolean("keep_intermediate_layers", v)?;
        }
    }

    // [monitor] section
    if let Some(section) = ini.section(Some("monitor")) {
        let keys = SectionReader::new("monitor", section);
        if let Some(v) = keys.get("poll_interval_ms") {
            config.monitor.poll_interval_ms = match v.parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(keys.invalid(
                        "poll_interval_ms",
                        v,
                        "must be a positive integer (milliseconds)",
                    ))
                }
            };
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        let keys = SectionReader::new("logging", section);
        if let Some(v) = keys.get("directory") {
            if !v.is_empty() {
                config.logging.directory = Some(expand_tilde(v));
            }
        }
        if let Some(v) = keys.get("file") {
            if v.is_empty() || v.contains(['/', '\\']) {
                return Err(keys.invalid("file", v, "must be a plain file name"));
            }
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

/// Trimmed key access plus error construction for one section.
struct SectionReader<'a> {
    name: &'static str,
    section: &'a Properties,
}

impl<'a> SectionReader<'a> {
    fn new(name: &'static str, section: &'a Properties) -> Self {
        Self { name, section }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.section.get(key).map(str::trim)
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn number(
        &self,
        key: &str,
        value: &str,
        accept: impl Fn(f64) -> bool,
        reason: &str,
    ) -> Result<f64, ConfigFileError> {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && accept(n) => Ok(n),
            _ => Err(self.invalid(key, value, reason)),
        }
    }

    fn boolean(&self, key: &str, value: &str) -> Result<bool, ConfigFileError> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(key, value, "must be true or false")),
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
