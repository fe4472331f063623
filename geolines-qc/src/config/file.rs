//! Configuration file handling for `~/.geolines-qc/config.ini`.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;

/// Errors reading or writing `config.ini`.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but could not be read as INI.
    #[error("cannot read {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A key holds a value of the wrong shape or range.
    #[error("invalid [{section}] {key} = '{value}': {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("cannot create config directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigFile {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load `path`, or the defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigFileError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(|source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render as commented INI text, as written by [`save_to`](Self::save_to).
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Write the default config file unless `path` already exists.
    ///
    /// Returns true if a file was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }
}

/// Path to the config directory (`~/.geolines-qc`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geolines-qc")
}

/// Path to the config file (`~/.geolines-qc/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_POLL_INTERVAL_MS;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.monitor.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.analysis.segment_length = 250.0;
        config.analysis.tag_field = "near_river".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_ensure_exists_keeps_existing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        assert!(ConfigFile::ensure_exists_at(&path).unwrap());
        std::fs::write(&path, "[analysis]\nbuffer_distance = 1\n").unwrap();
        assert!(!ConfigFile::ensure_exists_at(&path).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap().analysis.buffer_distance, 1.0);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[monitor]\npoll_interval_ms = soon\n").unwrap();
        match ConfigFile::load_from(&path).unwrap_err() {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!((section.as_str(), key.as_str()), ("monitor", "poll_interval_ms"));
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".geolines-qc/config.ini"));
    }
}
