//! Diagnostic logging interface for pipeline components.
//!
//! Stage executors and the task controller never talk to `tracing` directly.
//! They receive an `Arc<dyn Logger>` through their context and write through
//! the `log_*!` macros, so a run can be silenced in tests or captured for
//! inspection without touching the global subscriber.
//!
//! - [`Logger`]: the interface handed to components
//! - [`TracingLogger`]: production adapter forwarding to `tracing`
//! - [`NoOpLogger`]: discards everything
//! - [`MemoryLogger`]: keeps messages in memory for assertions
//!
//! ```
//! use geolines_qc::log::{Logger, NoOpLogger};
//! use geolines_qc::log_info;
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "segmented {} features", 12);
//! ```

mod logger;
mod memory;
mod noop;
mod tracing_adapter;

pub use logger::{LogLevel, Logger};
pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use tracing_adapter::TracingLogger;
