//! Task lifecycle, progress and control surface.
//!
//! A [`Task`] owns one analysis run: its enabled stages, its working layer
//! and its [`TaskState`]. The caller only ever sees the [`TaskHandle`],
//! which reads shared state and never blocks (except `join`/`wait`).
//!
//! # Progress budgets
//!
//! | Stage    | Range   |
//! |----------|---------|
//! | Clip     | 0-5     |
//! | Extract  | 5-10    |
//! | Split    | 10-50   |
//! | Tag      | 50-90   |
//! | finalize | 100     |

mod controller;
mod handle;
mod id;
mod options;
mod progress;
mod state;

pub use controller::Task;
pub use handle::{ProgressSnapshot, TaskError, TaskHandle, TaskObserver};
pub use id::TaskId;
pub use options::TaskOptions;
pub use progress::{Progress, ProgressBudget, FINALIZE_PROGRESS};
pub use state::{InvalidTransition, TaskState};
