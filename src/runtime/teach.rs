use crate::inspect::{InspectOptions, InspectionResult, Inspector};
use crate::runtime::{LoopHandle, ResultSink, SharedState, DEFAULT_POLL_INTERVAL};
use crate::trace::{log_info, log_warn};
use crate::util::MarkAlignResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What the teaching loop computes on every pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessMode {
    /// Full pipeline including circle pairs and alignment.
    All,
    /// Mask stages and blob assignment only.
    Blobs,
    /// Circle pair search inside one anchor box.
    Circles { region: usize },
}

impl ProcessMode {
    pub fn name(self) -> &'static str {
        match self {
            ProcessMode::All => "all",
            ProcessMode::Blobs => "blobs",
            ProcessMode::Circles { .. } => "circles",
        }
    }
}

/// Re-runs the pipeline on the shared frame while parameters are tuned.
pub struct TeachLoop {
    shared: Arc<SharedState>,
    sink: Arc<dyn ResultSink>,
    mode: ProcessMode,
    opts: InspectOptions,
    interval: Duration,
}

impl TeachLoop {
    pub fn new(shared: Arc<SharedState>, sink: Arc<dyn ResultSink>, mode: ProcessMode) -> Self {
        Self {
            shared,
            sink,
            mode,
            opts: InspectOptions::default(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_options(mut self, opts: InspectOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }

    /// One pass against the current snapshot. Nothing is published while
    /// there is no frame or when the pipeline fails.
    pub fn run_once(&self) -> Option<Arc<InspectionResult>> {
        let snapshot = self.shared.snapshot();
        let frame = snapshot.frame?;
        let inspector = Inspector::new(snapshot.config).with_options(self.opts.clone());
        let outcome = match self.mode {
            ProcessMode::All => inspector.inspect(frame),
            ProcessMode::Blobs => inspector.inspect_blobs(frame),
            ProcessMode::Circles { region } => inspector.inspect_region(frame, region),
        };
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                self.sink.publish(Arc::clone(&result));
                Some(result)
            }
            Err(err) => {
                log_warn!("teaching pass ({}) failed: {err}", self.mode.name());
                None
            }
        }
    }

    pub fn run(&self, stop: &AtomicBool) {
        log_info!("teaching loop started in {} mode", self.mode.name());
        while !stop.load(Ordering::Acquire) {
            self.run_once();
            thread::sleep(self.interval);
        }
        log_info!("teaching loop stopped");
    }

    pub fn spawn(self) -> MarkAlignResult<LoopHandle> {
        LoopHandle::spawn("teach", move |stop| self.run(stop))
    }
}

#[cfg(test)]
mod tests {
    use super::{ProcessMode, TeachLoop};
    use crate::config::InspectionConfig;
    use crate::image::{Frame, OwnedImage};
    use crate::runtime::{ResultBoard, SharedState};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn no_frame_publishes_nothing() {
        let shared = Arc::new(SharedState::new(InspectionConfig::default()));
        let board = Arc::new(ResultBoard::new());
        let teach = TeachLoop::new(shared, board.clone(), ProcessMode::All);
        assert!(teach.run_once().is_none());
        assert_eq!(board.published(), 0);
    }

    #[test]
    fn blobs_mode_publishes_mask() {
        let shared = Arc::new(SharedState::new(InspectionConfig::default()));
        shared.replace_frame(Frame::from_gray(OwnedImage::filled(32, 32, 90).unwrap()));
        let board = Arc::new(ResultBoard::new());
        let teach = TeachLoop::new(shared, board.clone(), ProcessMode::Blobs);
        let result = teach.run_once().unwrap();
        assert!(result.mask.is_some());
        assert!(result.slots.iter().all(|s| s.pair.is_none()));
        assert_eq!(board.published(), 1);
    }

    #[test]
    fn spawned_loop_keeps_publishing() {
        let shared = Arc::new(SharedState::new(InspectionConfig::default()));
        shared.replace_frame(Frame::from_gray(OwnedImage::filled(16, 16, 10).unwrap()));
        let board = Arc::new(ResultBoard::new());
        let handle = TeachLoop::new(shared, board.clone(), ProcessMode::Circles { region: 0 })
            .with_interval(Duration::from_millis(1))
            .spawn()
            .unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while board.published() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();
        assert!(board.published() >= 3);
    }
}
