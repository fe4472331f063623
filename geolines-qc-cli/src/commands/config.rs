//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path`.

use std::path::PathBuf;

use clap::Subcommand;
use geolines_qc::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `path` (or the default config file).
pub fn run(command: ConfigCommands, path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_init(path: &std::path::Path, force: bool) -> Result<(), CliError> {
    let written = if force {
        ConfigFile::default().save_to(path)?;
        true
    } else {
        ConfigFile::ensure_exists_at(path)?
    };

    if written {
        println!("Configuration file: {}", path.display());
        println!();
        println!("Edit this file to customize GeoLines QC settings.");
        println!("CLI arguments override config file values when specified.");
    } else {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to replace it with the defaults.");
    }
    Ok(())
}

fn run_show(path: &std::path::Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    println!("# {}", path.display());
    print!("{}", config.to_ini_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_keeps_existing_file_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        run(ConfigCommands::Init { force: false }, Some(path.clone())).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[analysis]\nbuffer_distance = 42\n").unwrap();
        run(ConfigCommands::Init { force: false }, Some(path.clone())).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().analysis.buffer_distance, 42.0);

        run(ConfigCommands::Init { force: true }, Some(path.clone())).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_show_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[analysis]\nbuffer_distance = far\n").unwrap();
        let err = run(ConfigCommands::Show, Some(path)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
