//! GeoLines QC CLI - Command-line interface
//!
//! Runs the proximity analysis on GeoJSON layers and manages the
//! configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geolines-qc")]
#[command(version, about = "Segment, buffer and tag line layers against a reference layer", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.geolines-qc/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis on a GeoJSON input layer
    Run {
        /// Input line layer (GeoJSON)
        #[arg(long)]
        input: PathBuf,

        /// Reference layer to tag against (GeoJSON)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Polygon mask restricting the analysis area (GeoJSON)
        #[arg(long)]
        mask: Option<PathBuf>,

        /// 0-based positions of mask features in file order (not GeoJSON
        /// `id` members) to use instead of the whole mask layer
        #[arg(long, value_delimiter = ',', requires = "mask")]
        select_mask: Vec<u64>,

        /// Buffer distance in layer units (default from config)
        #[arg(long)]
        buffer: Option<f64>,

        /// Segment length in layer units (default from config)
        #[arg(long)]
        segment_length: Option<f64>,

        /// Skip splitting into segments
        #[arg(long)]
        no_split: bool,

        /// Keep only features within this distance of the reference first
        #[arg(long, requires = "reference")]
        extract_within: Option<f64>,

        /// Output file (default: <result layer name>.geojson)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Name of the result layer
        #[arg(long)]
        output_name: Option<String>,

        /// Also write every intermediate stage output to this directory
        #[arg(long)]
        intermediate_dir: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Run {
            input,
            reference,
            mask,
            select_mask,
            buffer,
            segment_length,
            no_split,
            extract_within,
            output,
            output_name,
            intermediate_dir,
        } => commands::run::run(RunArgs {
            input,
            reference,
            mask,
            select_mask,
            buffer,
            segment_length,
            no_split,
            extract_within,
            output,
            output_name,
            intermediate_dir,
            config: cli.config,
        }),
        Commands::Config { command } => commands::config::run(command, cli.config),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_select_mask_help_names_file_order() {
        let cli = Cli::command();
        let run = cli.find_subcommand("run").unwrap();
        let arg = run
            .get_arguments()
            .find(|a| a.get_id() == "select_mask")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("0-based"));
        assert!(help.contains("file order"));
    }

    #[test]
    fn test_parse_run_with_selection() {
        let cli = Cli::try_parse_from([
            "geolines-qc",
            "run",
            "--input",
            "roads.geojson",
            "--mask",
            "zones.geojson",
            "--select-mask",
            "1,3",
            "--buffer",
            "25",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                select_mask,
                buffer,
                ..
            } => {
                assert_eq!(select_mask, vec![1, 3]);
                assert_eq!(buffer, Some(25.0));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_extract_requires_reference() {
        let parsed = Cli::try_parse_from([
            "geolines-qc",
            "run",
            "--input",
            "roads.geojson",
            "--extract-within",
            "10",
        ]);
        assert!(parsed.is_err());
    }
}
