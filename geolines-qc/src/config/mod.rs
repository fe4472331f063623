//! User configuration in `~/.geolines-qc/config.ini`.
//!
//! - [`settings`]: the [`ConfigFile`] structs
//! - [`defaults`]: `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser`: INI → [`ConfigFile`], validating every value
//! - `writer`: [`ConfigFile`] → commented INI
//! - [`file`]: load/save and path helpers
//!
//! A missing file yields the defaults; a malformed value is an error naming
//! the section, key and reason.

pub mod defaults;
pub mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{AnalysisSettings, ConfigFile, LoggingSettings, MonitorSettings};
