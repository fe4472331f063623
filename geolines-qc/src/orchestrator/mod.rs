//! Analysis orchestration.
//!
//! The [`Orchestrator`] turns an [`AnalysisRequest`] into a [`Task`]: it
//! validates the request, decides which stages run, and starts the task on
//! its own named worker thread. Invalid requests are rejected before any
//! task exists.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(Arc::new(PlanarEngine), Arc::new(TracingLogger));
//! let handle = orchestrator.submit(
//!     AnalysisRequest::new(roads).reference(rivers).buffer_distance(50.0),
//! )?;
//! handle.join();
//! ```

mod request;
mod validation;

pub use request::AnalysisRequest;
pub use validation::ValidationError;

use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::config::ConfigFile;
use crate::geometry::GeometryEngine;
use crate::layer::Layer;
use crate::log::Logger;
use crate::stage::{ClipStage, ExtractStage, SplitStage, Stage, StageKind, TagStage};
use crate::task::{Task, TaskHandle, TaskOptions};
use crate::{log_debug, log_info, log_warn};

/// Error returned when an analysis could not be started.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to start analysis worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Builds and launches analysis tasks.
pub struct Orchestrator {
    engine: Arc<dyn GeometryEngine>,
    logger: Arc<dyn Logger>,
    options: TaskOptions,
    split_segments: bool,
}

impl Orchestrator {
    /// Orchestrator with default task options and splitting enabled.
    pub fn new(engine: Arc<dyn GeometryEngine>, logger: Arc<dyn Logger>) -> Self {
        Self {
            engine,
            logger,
            options: TaskOptions::default(),
            split_segments: true,
        }
    }

    /// Orchestrator configured from the `[analysis]` section.
    pub fn from_config(
        config: &ConfigFile,
        engine: Arc<dyn GeometryEngine>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(engine, logger)
            .with_options(config.task_options())
            .with_split_segments(config.analysis.split_segments)
    }

    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_split_segments(mut self, enabled: bool) -> Self {
        self.split_segments = enabled;
        self
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    pub fn split_segments(&self) -> bool {
        self.split_segments
    }

    /// Validate `request` and return the stages it would run, in order.
    pub fn plan(&self, request: &AnalysisRequest) -> Result<Vec<StageKind>, ValidationError> {
        validation::validate(request, &self.options, self.split_segments)
    }

    /// Build a pending task without starting it.
    ///
    /// The caller runs it with [`Task::run`] on a thread of its choosing.
    pub fn prepare(&self, request: AnalysisRequest) -> Result<(Task, TaskHandle), ValidationError> {
        let kinds = match self.plan(&request) {
            Ok(kinds) => kinds,
            Err(e) => {
                log_warn!(self.logger, "Rejected analysis of '{}': {}", request.input.name(), e);
                return Err(e);
            }
        };
        let stages = kinds
            .iter()
            .filter_map(|kind| self.build_stage(*kind, &request))
            .collect::<Vec<_>>();
        log_debug!(
            self.logger,
            "Planned {} stage(s) for '{}': {}",
            stages.len(),
            request.input.name(),
            kinds.iter().map(|k| k.label()).collect::<Vec<_>>().join(", ")
        );

        let description = format!("Analysing {}", request.input.name());
        Ok(Task::new(
            description,
            request.input,
            stages,
            self.options.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.logger),
        ))
    }

    /// Validate `request` and start it on a new worker thread.
    pub fn submit(&self, request: AnalysisRequest) -> Result<TaskHandle, SubmitError> {
        let (task, handle) = self.prepare(request)?;
        let shared = Arc::clone(task.shared());

        let worker = thread::Builder::new()
            .name(format!("geolines-{}", handle.id()))
            .spawn(move || {
                task.run();
            })
            .map_err(SubmitError::Spawn)?;
        shared.attach_worker(worker);

        log_info!(self.logger, "Submitted {} ({})", handle.id(), handle.description());
        Ok(handle)
    }

    /// Tag `input` against `reference`, optionally clipped to `mask`.
    pub fn submit_layers(
        &self,
        input: Arc<Layer>,
        reference: Arc<Layer>,
        mask: Option<Arc<Layer>>,
        buffer_distance: f64,
        split_length: f64,
    ) -> Result<TaskHandle, SubmitError> {
        let mut request = AnalysisRequest::new(input)
            .reference(reference)
            .buffer_distance(buffer_distance)
            .split_length(split_length);
        if let Some(mask) = mask {
            request = request.mask(mask);
        }
        self.submit(request)
    }

    fn build_stage(&self, kind: StageKind, request: &AnalysisRequest) -> Option<Box<dyn Stage>> {
        let stage: Box<dyn Stage> = match kind {
            StageKind::Clip => Box::new(ClipStage::new(Arc::clone(request.mask.as_ref()?))),
            StageKind::Extract => Box::new(ExtractStage::new(
                Arc::clone(request.reference.as_ref()?),
                request.extract_distance?,
                self.options.arc_segments,
            )),
            StageKind::Split => Box::new(SplitStage::new(request.split_length)),
            StageKind::Tag => {
                let reference = request.reference.as_ref()?;
                let name = request.output_name.clone().unwrap_or_else(|| {
                    format!(
                        "{} - {} {}",
                        request.input.name(),
                        reference.name(),
                        request.buffer_distance
                    )
                });
                Box::new(
                    TagStage::new(Arc::clone(reference), request.buffer_distance)
                        .with_arc_segments(self.options.arc_segments)
                        .with_field(self.options.tag_field.clone())
                        .with_output_name(name),
                )
            }
        };
        Some(stage)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .field("split_segments", &self.split_segments)
            .finish()
    }
}
