//! Task controller: runs the enabled stages of one task in order.
//!
//! The controller owns the working layer. Each stage consumes the previous
//! stage's output (or a copy of the input layer for the first stage), so a
//! stage never sees a half-built layer and the caller's input is never
//! modified. The first failure or observed cancellation ends the run; no
//! later stage starts and nothing is published as a result.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::handle::{TaskError, TaskShared};
use super::progress::{ProgressBudget, FINALIZE_PROGRESS};
use super::{TaskHandle, TaskOptions, TaskState};
use crate::geometry::GeometryEngine;
use crate::layer::Layer;
use crate::log::Logger;
use crate::stage::{Stage, StageContext, StageKind, StageResult};
use crate::{log_debug, log_error, log_info, log_warn};

/// One analysis run, ready to execute on a worker thread.
pub struct Task {
    shared: Arc<TaskShared>,
    input: Arc<Layer>,
    stages: Vec<Box<dyn Stage>>,
    options: TaskOptions,
    engine: Arc<dyn GeometryEngine>,
    logger: Arc<dyn Logger>,
}

impl Task {
    /// Create a pending task and its handle.
    ///
    /// `stages` must already be in execution order.
    pub fn new(
        description: impl Into<String>,
        input: Arc<Layer>,
        stages: Vec<Box<dyn Stage>>,
        options: TaskOptions,
        engine: Arc<dyn GeometryEngine>,
        logger: Arc<dyn Logger>,
    ) -> (Self, TaskHandle) {
        let shared = TaskShared::new(description);
        let handle = TaskHandle::new(Arc::clone(&shared));
        let task = Self {
            shared,
            input,
            stages,
            options,
            engine,
            logger,
        };
        (task, handle)
    }

    /// Stages this task will run.
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub(crate) fn shared(&self) -> &Arc<TaskShared> {
        &self.shared
    }

    /// Execute every stage on the calling thread and return the terminal
    /// state.
    ///
    /// A panic escaping a stage is reported as a failure.
    pub fn run(self) -> TaskState {
        let shared = Arc::clone(&self.shared);
        let logger = Arc::clone(&self.logger);
        let id = shared.id();

        match catch_unwind(AssertUnwindSafe(|| self.run_stages())) {
            Ok(state) => state,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log_error!(logger, "[{}] worker panicked: {}", id, message);
                let error = TaskError::Panicked(message);
                shared.set_summary(format!("Analysis failed: {error}"));
                shared.set_error(error);
                if shared.state() == TaskState::Pending {
                    let _ = shared.transition(TaskState::Running);
                }
                let _ = shared.transition(TaskState::Failed);
                shared.state()
            }
        }
    }

    fn run_stages(self) -> TaskState {
        let id = self.shared.id();
        self.transition(TaskState::Running);
        log_info!(
            self.logger,
            "[{}] Starting: {} ({} stage(s))",
            id,
            self.input.name(),
            self.stages.len()
        );

        let input_len = self.input.len();
        let mut layer = Layer::clone(&self.input);
        let mut intermediates = Vec::new();
        let cancel = self.shared.cancel_token();
        let progress = self.shared.progress();

        for (position, stage) in self.stages.iter().enumerate() {
            let kind = stage.kind();
            if cancel.is_cancelled() {
                return self.finish_cancelled(kind);
            }

            let budget = ProgressBudget::for_stage(kind);
            progress.advance(budget.start);
            let sink = move |percent: f64| progress.advance(budget.map(percent));
            let ctx = StageContext::new(self.engine.as_ref(), cancel, &sink, self.logger.as_ref());

            log_debug!(self.logger, "[{}] {} on '{}'", id, kind, layer.name());
            match stage.execute(layer, &ctx) {
                StageResult::Completed(output) => {
                    progress.advance(budget.end);
                    log_debug!(
                        self.logger,
                        "[{}] {} done: '{}' has {} feature(s)",
                        id,
                        kind,
                        output.name(),
                        output.len()
                    );
                    if self.options.keep_intermediate_layers && position + 1 < self.stages.len() {
                        intermediates.push(Arc::new(output.clone()));
                    }
                    layer = output;
                }
                StageResult::Failed(error) => {
                    log_warn!(self.logger, "[{}] {}", id, error);
                    let error = TaskError::from(error);
                    self.shared.set_summary(format!("Analysis failed: {error}"));
                    self.shared.set_error(error);
                    self.transition(TaskState::Failed);
                    return TaskState::Failed;
                }
                StageResult::Cancelled => return self.finish_cancelled(kind),
            }
        }

        if cancel.is_cancelled() {
            return self.finish_cancelled_at_finalize();
        }

        let summary = self.summarize(&layer, input_len);
        log_info!(self.logger, "[{}] {}", id, summary);
        self.shared.set_summary(summary);
        self.shared.set_result(layer, intermediates);
        progress.advance(FINALIZE_PROGRESS);
        self.transition(TaskState::Completed);
        TaskState::Completed
    }

    fn finish_cancelled(&self, stage: StageKind) -> TaskState {
        log_info!(self.logger, "[{}] Cancelled during {}", self.shared.id(), stage);
        self.shared
            .set_summary(format!("Analysis cancelled during {}", stage.label().to_lowercase()));
        self.transition(TaskState::Cancelled);
        TaskState::Cancelled
    }

    fn finish_cancelled_at_finalize(&self) -> TaskState {
        log_info!(self.logger, "[{}] Cancelled before finalizing", self.shared.id());
        self.shared
            .set_summary("Analysis cancelled before finalizing".to_string());
        self.transition(TaskState::Cancelled);
        TaskState::Cancelled
    }

    fn transition(&self, to: TaskState) {
        if let Err(e) = self.shared.transition(to) {
            log_warn!(self.logger, "[{}] {}", self.shared.id(), e);
        }
    }

    fn summarize(&self, result: &Layer, input_len: usize) -> String {
        let kinds = self.stage_kinds();
        let mut summary = if kinds.contains(&StageKind::Split) {
            format!(
                "Analysis complete: {} segment(s) from {} input feature(s) in '{}'",
                result.len(),
                input_len,
                result.name()
            )
        } else {
            format!(
                "Analysis complete: '{}' has {} feature(s) from {} input feature(s)",
                result.name(),
                result.len(),
                input_len
            )
        };
        if kinds.contains(&StageKind::Tag) {
            if let Some(idx) = result.schema().index_of(&self.options.tag_field) {
                let flagged = result
                    .features()
                    .filter(|f| f.attribute(idx).and_then(|v| v.as_bool()) == Some(true))
                    .count();
                summary.push_str(&format!(
                    ", {} with {} = true",
                    flagged, self.options.tag_field
                ));
            }
        }
        summary
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.shared.id())
            .field("stages", &self.stage_kinds())
            .field("options", &self.options)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
