//! Task handle for status queries and cancellation.
//!
//! A [`TaskHandle`] is returned when an analysis is submitted. It is
//! cloneable; all clones refer to the same task. Every query is a
//! non-blocking read of shared state, so an interactive caller can poll it
//! freely while the worker thread runs.
//!
//! # Example
//!
//! ```ignore
//! let handle = orchestrator.submit(request)?;
//!
//! // Poll without blocking
//! println!("{}% ({})", handle.progress(), handle.state());
//!
//! // Request a cooperative stop
//! handle.cancel();
//!
//! // Block until the worker finishes
//! match handle.join() {
//!     TaskState::Completed => println!("{}", handle.summary().unwrap_or_default()),
//!     TaskState::Failed => eprintln!("{}", handle.error().unwrap()),
//!     _ => {}
//! }
//! ```

use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{InvalidTransition, Progress, TaskId, TaskState};
use crate::layer::Layer;
use crate::stage::StageError;

/// Error attached to a failed task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// A stage reported an error.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// The worker panicked.
    #[error("analysis worker panicked: {0}")]
    Panicked(String),
}

/// What the worker leaves behind for the caller.
#[derive(Debug, Default)]
struct Outcome {
    result: Option<Arc<Layer>>,
    intermediates: Vec<Arc<Layer>>,
    error: Option<TaskError>,
    summary: Option<String>,
}

/// State shared by the worker, the handles and the observers.
pub(crate) struct TaskShared {
    id: TaskId,
    description: String,
    progress: Progress,
    cancel: CancellationToken,
    state_tx: watch::Sender<TaskState>,
    outcome: Mutex<Outcome>,
    finished: Mutex<()>,
    finished_cv: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TaskShared {
    pub(crate) fn new(description: impl Into<String>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(TaskState::Pending);
        Arc::new(Self {
            id: TaskId::next(),
            description: description.into(),
            progress: Progress::new(),
            cancel: CancellationToken::new(),
            state_tx,
            outcome: Mutex::new(Outcome::default()),
            finished: Mutex::new(()),
            finished_cv: Condvar::new(),
            worker: Mutex::new(None),
        })
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn progress(&self) -> &Progress {
        &self.progress
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn state(&self) -> TaskState {
        *self.state_tx.borrow()
    }

    /// Apply a state change if the state machine allows it.
    pub(crate) fn transition(&self, to: TaskState) -> Result<(), InvalidTransition> {
        let _guard = self.finished.lock();
        let mut outcome = Ok(());
        self.state_tx.send_if_modified(|state| {
            if state.can_transition_to(to) {
                *state = to;
                true
            } else {
                outcome = Err(InvalidTransition { from: *state, to });
                false
            }
        });
        if outcome.is_ok() && to.is_terminal() {
            self.finished_cv.notify_all();
        }
        outcome
    }

    pub(crate) fn set_result(&self, result: Layer, intermediates: Vec<Arc<Layer>>) {
        let mut outcome = self.outcome.lock();
        outcome.result = Some(Arc::new(result));
        outcome.intermediates = intermediates;
    }

    pub(crate) fn set_error(&self, error: TaskError) {
        self.outcome.lock().error = Some(error);
    }

    pub(crate) fn set_summary(&self, summary: String) {
        self.outcome.lock().summary = Some(summary);
    }

    pub(crate) fn attach_worker(&self, worker: JoinHandle<()>) {
        *self.worker.lock() = Some(worker);
    }

    fn wait_terminal(&self) -> TaskState {
        let mut guard = self.finished.lock();
        loop {
            let state = self.state();
            if state.is_terminal() {
                return state;
            }
            self.finished_cv.wait(&mut guard);
        }
    }
}

/// Handle to a submitted analysis task.
///
/// All accessors are non-blocking except [`join`](Self::join) and
/// [`wait`](Self::wait).
#[derive(Clone)]
pub struct TaskHandle {
    shared: Arc<TaskShared>,
}

impl TaskHandle {
    pub(crate) fn new(shared: Arc<TaskShared>) -> Self {
        Self { shared }
    }

    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    /// Description given at submission, e.g. `Analysing roads`.
    pub fn description(&self) -> &str {
        &self.shared.description
    }

    /// Overall progress, 0 to 100, never decreasing.
    pub fn progress(&self) -> u8 {
        self.shared.progress.get()
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Request a cooperative stop.
    ///
    /// The worker observes the request at its next checkpoint. Has no
    /// effect on a task that already finished.
    pub fn cancel(&self) {
        if !self.state().is_terminal() {
            self.shared.cancel.cancel();
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Output layer; `None` unless the task completed.
    pub fn result(&self) -> Option<Arc<Layer>> {
        if self.state() != TaskState::Completed {
            return None;
        }
        self.shared.outcome.lock().result.clone()
    }

    /// Outputs of the stages before the last one, in stage order.
    ///
    /// Empty unless the task completed with intermediate layers kept.
    pub fn intermediate_layers(&self) -> Vec<Arc<Layer>> {
        if self.state() != TaskState::Completed {
            return Vec::new();
        }
        self.shared.outcome.lock().intermediates.clone()
    }

    /// Error; `None` unless the task failed.
    pub fn error(&self) -> Option<TaskError> {
        if self.state() != TaskState::Failed {
            return None;
        }
        self.shared.outcome.lock().error.clone()
    }

    /// Human-readable outcome, set once the task is terminal.
    pub fn summary(&self) -> Option<String> {
        self.shared.outcome.lock().summary.clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait asynchronously for a terminal state.
    pub async fn wait(&self) -> TaskState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Block the calling thread until the task is terminal.
    pub fn join(&self) -> TaskState {
        let state = self.shared.wait_terminal();
        let worker = self.shared.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
        state
    }

    /// Weak observer that does not keep the task alive.
    pub fn observer(&self) -> TaskObserver {
        TaskObserver {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .field("progress", &self.progress())
            .finish()
    }
}

/// Point-in-time view of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub id: TaskId,
    pub progress: u8,
    pub state: TaskState,
    pub cancel_requested: bool,
}

/// Weak view of a task for pollers.
///
/// Reads against a task that has since been dropped return `None`.
#[derive(Clone, Debug)]
pub struct TaskObserver {
    shared: Weak<TaskShared>,
}

impl TaskObserver {
    /// Current snapshot, or `None` once the task is gone.
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.shared.upgrade().map(|shared| ProgressSnapshot {
            id: shared.id,
            progress: shared.progress.get(),
            state: shared.state(),
            cancel_requested: shared.cancel.is_cancelled(),
        })
    }

    /// Strong handle, if the task still exists.
    pub fn upgrade(&self) -> Option<TaskHandle> {
        self.shared.upgrade().map(TaskHandle::new)
    }
}
