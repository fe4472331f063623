//! Progress polling for running tasks.
//!
//! A [`ProgressMonitor`] spawns a background thread that samples a task
//! through a weak [`TaskObserver`] at a fixed interval and hands each
//! [`ProgressSnapshot`] to a callback. Polling ends when:
//! - the task reaches a terminal state (after one final report)
//! - the task has been dropped (the weak read fails; no error surfaces)
//! - the monitor is stopped or dropped

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::task::{ProgressSnapshot, TaskObserver};

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Background poller relaying task progress to a callback.
pub struct ProgressMonitor {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ProgressMonitor {
    /// Start polling `observer` every `interval`.
    pub fn start<F>(observer: TaskObserver, interval: Duration, callback: F) -> Self
    where
        F: Fn(ProgressSnapshot) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Acquire) {
                let Some(snapshot) = observer.snapshot() else {
                    return;
                };
                callback(snapshot);
                if snapshot.state.is_terminal() {
                    return;
                }
                thread::sleep(interval);
            }
        });

        Self {
            handle: Some(handle),
            stop,
        }
    }

    /// Start a monitor with the default 100ms interval.
    pub fn start_default<F>(observer: TaskObserver, callback: F) -> Self
    where
        F: Fn(ProgressSnapshot) + Send + 'static,
    {
        Self::start(observer, DEFAULT_POLL_INTERVAL, callback)
    }

    /// Whether the polling thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for polling to end on its own (terminal state or dropped task).
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Stop polling and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ProgressMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressMonitor")
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarEngine;
    use crate::layer::{Crs, GeometryKind, Layer};
    use crate::log::NoOpLogger;
    use crate::stage::{Stage, StageContext, StageKind, StageResult};
    use crate::task::{Task, TaskOptions, TaskState};
    use parking_lot::Mutex;
    use std::sync::mpsc;

    /// Blocks until released, then completes.
    struct Gate(Mutex<mpsc::Receiver<()>>);

    impl Stage for Gate {
        fn kind(&self) -> StageKind {
            StageKind::Split
        }

        fn execute(&self, input: Layer, ctx: &StageContext<'_>) -> StageResult {
            ctx.report(50.0);
            let _ = self.0.lock().recv();
            StageResult::Completed(input)
        }
    }

    fn gated_task() -> (Task, crate::task::TaskHandle, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let stages: Vec<Box<dyn Stage>> = vec![Box::new(Gate(Mutex::new(rx)))];
        let (task, handle) = Task::new(
            "gated",
            Arc::new(Layer::new("roads", Crs::default(), GeometryKind::Line)),
            stages,
            TaskOptions::default(),
            Arc::new(PlanarEngine),
            Arc::new(NoOpLogger),
        );
        (task, handle, tx)
    }

    #[test]
    fn test_final_report_on_terminal_state() {
        let (task, handle, release) = gated_task();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let monitor = ProgressMonitor::start(handle.observer(), Duration::from_millis(5), move |s| {
            sink.lock().push(s)
        });

        let worker = thread::spawn(move || task.run());
        thread::sleep(Duration::from_millis(30));
        release.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), TaskState::Completed);
        monitor.wait();

        let seen = seen.lock();
        let last = seen.last().unwrap();
        assert_eq!(last.state, TaskState::Completed);
        assert_eq!(last.progress, 100);
        assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(seen.iter().any(|s| s.state == TaskState::Running && s.progress == 30));
    }

    #[test]
    fn test_dropped_task_ends_polling() {
        let (task, handle, _release) = gated_task();
        let observer = handle.observer();
        drop(task);
        drop(handle);

        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let monitor = ProgressMonitor::start(observer, Duration::from_millis(1), move |_| {
            *counter.lock() += 1
        });
        monitor.wait();
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_stop_ends_polling() {
        let (_task, handle, _release) = gated_task();
        let monitor = ProgressMonitor::start_default(handle.observer(), |_| {});
        assert!(!monitor.is_finished());
        monitor.stop();
        assert_eq!(handle.state(), TaskState::Pending);
    }
}
