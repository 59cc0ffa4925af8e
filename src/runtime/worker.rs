use crate::camera::CameraHandle;
use crate::runtime::{LoopHandle, SharedState};
use crate::trace::{log_info, log_warn};
use crate::util::MarkAlignResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Grabs frames continuously into the shared frame slot.
pub struct CameraWorker {
    camera: CameraHandle,
    shared: Arc<SharedState>,
    interval: Duration,
}

impl CameraWorker {
    pub fn new(camera: CameraHandle, shared: Arc<SharedState>) -> Self {
        Self {
            camera,
            shared,
            interval: Duration::from_millis(30),
        }
    }

    /// Pause between grabs.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Grabs until `stop` is set, then closes the camera.
    /// Returns early when the camera cannot be started.
    pub fn run(&mut self, stop: &AtomicBool) {
        if let Err(err) = self.camera.open_and_start() {
            log_warn!(
                "camera {} unavailable: {} ({err})",
                self.camera.model_name(),
                err.code()
            );
            return;
        }
        log_info!("grabbing from {}", self.camera.model_name());
        while !stop.load(Ordering::Acquire) {
            match self.camera.grab() {
                Ok(frame) => {
                    self.shared.replace_frame(frame);
                }
                Err(err) => {
                    log_warn!("grab failed: {} ({err})", err.code());
                }
            }
            thread::sleep(self.interval);
        }
        if let Err(err) = self.camera.close() {
            log_warn!("camera close failed: {} ({err})", err.code());
        }
    }

    pub fn spawn(mut self) -> MarkAlignResult<LoopHandle> {
        LoopHandle::spawn("camera", move |stop| self.run(stop))
    }
}
