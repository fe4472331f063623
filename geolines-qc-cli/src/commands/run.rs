//! Run command - analyse an input layer against a reference layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use geolines_qc::io::{read_layer, write_layer};
use geolines_qc::layer::{FeatureId, Layer};
use geolines_qc::monitor::ProgressMonitor;
use geolines_qc::orchestrator::AnalysisRequest;
use geolines_qc::task::TaskState;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
pub struct RunArgs {
    pub input: PathBuf,
    pub reference: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub select_mask: Vec<u64>,
    pub buffer: Option<f64>,
    pub segment_length: Option<f64>,
    pub no_split: bool,
    pub extract_within: Option<f64>,
    pub output: Option<PathBuf>,
    pub output_name: Option<String>,
    pub intermediate_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Run the analysis and write its result.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("run");

    // CLI arguments override config values
    let mut config = runner.config().clone();
    if let Some(buffer) = args.buffer {
        config.analysis.buffer_distance = buffer;
    }
    if let Some(length) = args.segment_length {
        config.analysis.segment_length = length;
    }
    if args.no_split {
        config.analysis.split_segments = false;
    }
    if args.intermediate_dir.is_some() {
        config.analysis.keep_intermediate_layers = true;
    }

    let input = load(&args.input)?;
    let mut request = AnalysisRequest::new(input)
        .buffer_distance(config.analysis.buffer_distance)
        .split_length(config.analysis.segment_length);
    if let Some(path) = &args.reference {
        request = request.reference(load(path)?);
    }
    if let Some(path) = &args.mask {
        let mut mask = load(path)?;
        if !args.select_mask.is_empty() {
            mask.select(args.select_mask.iter().map(|id| FeatureId(*id)))
                .map_err(|e| CliError::InvalidArgument(format!("--select-mask: {}", e)))?;
        }
        request = request.mask(mask);
    }
    if let Some(distance) = args.extract_within {
        request = request.extract_within(distance);
    }
    if let Some(name) = &args.output_name {
        request = request.output_name(name.clone());
    }

    let orchestrator = runner.orchestrator(&config);
    let stages = orchestrator.plan(&request).map_err(|e| CliError::Submit(e.into()))?;

    println!("GeoLines QC v{}", geolines_qc::VERSION);
    println!("================");
    println!();
    println!("Input:   {} ({} features)", args.input.display(), request.input().len());
    if let Some(path) = &args.reference {
        println!("Against: {} (buffer {})", path.display(), request.buffer());
    }
    println!(
        "Stages:  {}",
        stages.iter().map(|s| s.label()).collect::<Vec<_>>().join(" -> ")
    );
    println!("Log:     {}", runner.log_path().display());
    println!();

    let handle = orchestrator.submit(request)?;

    let cancel_handle = handle.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, cancelling...");
        cancel_handle.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.set_message(handle.description().to_string());
    let sink = bar.clone();
    let monitor = ProgressMonitor::start(handle.observer(), config.poll_interval(), move |snapshot| {
        sink.set_position(u64::from(snapshot.progress));
        if snapshot.cancel_requested {
            sink.set_message("cancelling");
        }
    });

    let state = handle.join();
    monitor.wait();
    bar.finish_and_clear();

    let summary = handle.summary().unwrap_or_default();
    match state {
        TaskState::Completed => {}
        TaskState::Cancelled => return Err(CliError::Cancelled(summary)),
        _ => {
            return Err(match handle.error() {
                Some(error) => CliError::Analysis(error),
                None => CliError::Cancelled(summary),
            })
        }
    }

    let Some(result) = handle.result() else {
        return Err(CliError::Cancelled(summary));
    };
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.geojson", file_stem_for(result.name()))));
    save(&result, &output)?;

    if let Some(dir) = &args.intermediate_dir {
        for layer in handle.intermediate_layers() {
            let path = dir.join(format!("{}.geojson", file_stem_for(layer.name())));
            save(&layer, &path)?;
        }
    }

    println!("{} {}", style("✓").green(), summary);
    println!("  Output: {}", output.display());
    Ok(())
}

fn load(path: &Path) -> Result<Layer, CliError> {
    let layer = read_layer(path).map_err(|error| CliError::Input {
        path: path.to_path_buf(),
        error,
    })?;
    info!("Loaded '{}' with {} feature(s)", layer.name(), layer.len());
    Ok(layer)
}

fn save(layer: &Arc<Layer>, path: &Path) -> Result<(), CliError> {
    write_layer(layer, path).map_err(|error| CliError::Output {
        path: path.to_path_buf(),
        error,
    })?;
    info!("Wrote '{}' to {}", layer.name(), path.display());
    if layer.is_empty() {
        warn!("'{}' has no features", layer.name());
    }
    Ok(())
}

/// File name stem for a layer name, with path separators replaced.
fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "result".to_string()
    } else {
        stem.to_string()
    }
}
