//! Threads and shared state around the pipeline.
//!
//! - [`SharedState`] holds the latest frame and the active configuration
//!   behind one lock.
//! - [`TriggerSlot`] holds the responder of an armed network trigger.
//! - [`TriggerServer`] accepts trigger requests over TCP.
//! - [`AutoMachine`] sequences acquisition, processing, reply and reset.
//! - [`TeachLoop`] re-runs the pipeline on the shared frame for tuning.
//! - [`CameraWorker`] keeps the shared frame fresh from a camera.
//! - [`Session`] keeps at most one of the teaching and automatic modes alive.
//!
//! Every loop runs on its own thread and is stopped through a [`LoopHandle`].

use crate::inspect::InspectionResult;
use crate::trace::log_warn;
use crate::util::MarkAlignResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

mod auto;
mod server;
mod session;
mod shared;
mod teach;
mod trigger;
mod worker;

pub use auto::{AutoMachine, AutoState};
pub use server::{is_trigger_request, ServerConfig, TriggerServer, MAX_REQUEST_BYTES};
pub use session::{Mode, Session};
pub use shared::{SharedState, Snapshot};
pub use teach::{ProcessMode, TeachLoop};
pub use trigger::{Responder, TriggerSlot};
pub use worker::CameraWorker;

/// Sleep between iterations of the automatic and teaching loops.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Receives results produced by the loops.
pub trait ResultSink: Send + Sync {
    fn publish(&self, result: Arc<InspectionResult>);
}

impl<F> ResultSink for F
where
    F: Fn(Arc<InspectionResult>) + Send + Sync,
{
    fn publish(&self, result: Arc<InspectionResult>) {
        self(result)
    }
}

/// Sink that keeps only the latest result.
#[derive(Default)]
pub struct ResultBoard {
    latest: Mutex<Option<Arc<InspectionResult>>>,
    published: AtomicU64,
}

impl ResultBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent result, if any.
    pub fn latest(&self) -> Option<Arc<InspectionResult>> {
        self.latest.lock().clone()
    }

    /// Number of results published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl ResultSink for ResultBoard {
    fn publish(&self, result: Arc<InspectionResult>) {
        *self.latest.lock() = Some(result);
        self.published.fetch_add(1, Ordering::AcqRel);
    }
}

/// A named background thread with a cooperative stop flag.
///
/// Dropping the handle stops and joins the thread.
pub struct LoopHandle {
    name: String,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Spawns `body` on a new thread; `body` must return once the flag is set.
    pub fn spawn<F>(name: &str, body: F) -> MarkAlignResult<Self>
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(&flag))?;
        Ok(Self {
            name: name.to_string(),
            stop,
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the thread has not returned.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Requests the stop without waiting.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Requests the stop and waits for the thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.request_stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log_warn!("loop {} panicked", self.name);
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::{LoopHandle, ResultBoard, ResultSink};
    use crate::config::InspectionConfig;
    use crate::inspect::InspectionResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn loop_handle_stops_on_drop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        let handle = LoopHandle::spawn("ticker", move |stop| {
            while !stop.load(Ordering::Acquire) {
                seen.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
        assert_eq!(handle.name(), "ticker");
        std::thread::sleep(Duration::from_millis(20));
        drop(handle);
        let after = ticks.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(ticks.load(Ordering::Relaxed), after);
    }

    #[test]
    fn board_keeps_latest_and_counts() {
        let board = ResultBoard::new();
        assert!(board.latest().is_none());
        let cfg = InspectionConfig::default();
        board.publish(Arc::new(InspectionResult::empty(&cfg)));
        board.publish(Arc::new(InspectionResult::empty(&cfg)));
        assert_eq!(board.published(), 2);
        assert!(board.latest().is_some());
    }

    #[test]
    fn closures_are_sinks() {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let sink = move |_: Arc<InspectionResult>| {
            inner.fetch_add(1, Ordering::Relaxed);
        };
        sink.publish(Arc::new(InspectionResult::empty(&InspectionConfig::default())));
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
}
