//! GeoLines QC - proximity quality control for line layers.
//!
//! This library runs the analysis behind the GeoLines QC tool: an input
//! line layer is optionally clipped to a mask, filtered to features near a
//! reference layer, split into fixed-length segments, and finally tagged
//! with whether each segment's buffer touches the reference layer.
//!
//! Every analysis runs as a [`task::Task`] on a worker thread. Callers hold a
//! [`task::TaskHandle`] to read progress, request cancellation and collect
//! the result, or attach a [`monitor::ProgressMonitor`] that relays progress
//! at a fixed interval.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geolines_qc::geometry::PlanarEngine;
//! use geolines_qc::log::TracingLogger;
//! use geolines_qc::orchestrator::{AnalysisRequest, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(Arc::new(PlanarEngine), Arc::new(TracingLogger));
//! let handle = orchestrator.submit(
//!     AnalysisRequest::new(roads).reference(rivers).buffer_distance(50.0),
//! )?;
//! handle.join();
//! ```

pub mod config;
pub mod geometry;
pub mod index;
pub mod io;
pub mod layer;
pub mod log;
pub mod logging;
pub mod monitor;
pub mod orchestrator;
pub mod stage;
pub mod task;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
