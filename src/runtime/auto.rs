use crate::camera::CameraHandle;
use crate::config::InspectionConfig;
use crate::image::Frame;
use crate::inspect::{InspectOptions, InspectionResult, Inspector};
use crate::runtime::{LoopHandle, ResultSink, SharedState, TriggerSlot, DEFAULT_POLL_INTERVAL};
use crate::trace::{log_debug, log_info, log_warn};
use crate::util::MarkAlignResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Steps of the automatic cycle, visited in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoState {
    /// Idle until a trigger is armed.
    WaitTrigger,
    /// Snapshot the configuration and grab a frame.
    Preprocess,
    /// Run the pipeline (or build an empty result without a frame).
    Process,
    /// Send the message to the trigger peer and publish the result.
    Output,
    /// Disarm the trigger and drop the cycle's data.
    Release,
}

impl AutoState {
    pub fn name(self) -> &'static str {
        match self {
            AutoState::WaitTrigger => "wait_trigger",
            AutoState::Preprocess => "preprocess",
            AutoState::Process => "process",
            AutoState::Output => "output",
            AutoState::Release => "release",
        }
    }
}

/// Trigger-driven acquisition and reply cycle.
///
/// Each call to [`AutoMachine::step`] performs the work of the current state
/// and moves to the next one, so a full cycle takes five steps once the
/// trigger is armed. [`AutoMachine::run`] drives the steps with a short sleep
/// in between and stops at the next state boundary after the flag is set.
pub struct AutoMachine {
    shared: Arc<SharedState>,
    trigger: Arc<TriggerSlot>,
    camera: CameraHandle,
    sink: Arc<dyn ResultSink>,
    opts: InspectOptions,
    interval: Duration,
    state: AutoState,
    config: Option<Arc<InspectionConfig>>,
    frame: Option<Arc<Frame>>,
    result: Option<Arc<InspectionResult>>,
}

impl AutoMachine {
    pub fn new(
        shared: Arc<SharedState>,
        trigger: Arc<TriggerSlot>,
        camera: CameraHandle,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            shared,
            trigger,
            camera,
            sink,
            opts: InspectOptions::default(),
            interval: DEFAULT_POLL_INTERVAL,
            state: AutoState::WaitTrigger,
            config: None,
            frame: None,
            result: None,
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

    pub fn state(&self) -> AutoState {
        self.state
    }

    pub fn camera(&self) -> &CameraHandle {
        &self.camera
    }

    /// Opens the camera and starts grabbing. A failure is logged and the
    /// machine keeps running; every cycle then answers with an empty result.
    pub fn start_camera(&mut self) {
        if let Err(err) = self.camera.open_and_start() {
            log_warn!(
                "camera {} unavailable: {} ({err})",
                self.camera.model_name(),
                err.code()
            );
        }
    }

    /// Runs the current state and returns the new one.
    pub fn step(&mut self) -> AutoState {
        let next = match self.state {
            AutoState::WaitTrigger => {
                if self.trigger.is_armed() {
                    AutoState::Preprocess
                } else {
                    AutoState::WaitTrigger
                }
            }
            AutoState::Preprocess => {
                self.config = Some(self.shared.config());
                self.frame = match self.camera.grab() {
                    Ok(frame) => Some(Arc::new(frame)),
                    Err(err) => {
                        log_warn!("grab failed: {} ({err})", err.code());
                        None
                    }
                };
                AutoState::Process
            }
            AutoState::Process => {
                let result = self.process();
                self.result = Some(Arc::new(result));
                AutoState::Output
            }
            AutoState::Output => {
                if let Some(result) = &self.result {
                    match self.trigger.respond(&result.message) {
                        Ok(()) => {
                            log_info!("sent {}", result.message);
                        }
                        Err(err) => {
                            log_warn!("reply failed: {err}");
                        }
                    }
                    self.sink.publish(Arc::clone(result));
                }
                AutoState::Release
            }
            AutoState::Release => {
                self.trigger.release();
                self.config = None;
                self.frame = None;
                self.result = None;
                AutoState::WaitTrigger
            }
        };
        if next != self.state {
            log_debug!("auto step {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
        next
    }

    /// Steps until `stop` is set. An armed trigger is released on exit.
    pub fn run(&mut self, stop: &AtomicBool) {
        log_info!("auto mode started");
        loop {
            self.step();
            if stop.load(Ordering::Acquire) {
                break;
            }
            thread::sleep(self.interval);
        }
        if self.trigger.release() {
            log_warn!("auto mode stopped with a pending trigger");
        }
        self.state = AutoState::WaitTrigger;
        log_info!("auto mode stopped");
    }

    /// Starts the camera and runs the machine on its own thread.
    /// The camera is closed when the thread ends.
    pub fn spawn(mut self) -> MarkAlignResult<LoopHandle> {
        LoopHandle::spawn("auto", move |stop| {
            self.start_camera();
            self.run(stop);
        })
    }

    fn process(&self) -> InspectionResult {
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| self.shared.config());
        let inspector = Inspector::new(config).with_options(self.opts.clone());
        let Some(frame) = &self.frame else {
            return inspector.empty_result();
        };
        match inspector.inspect(Arc::clone(frame)) {
            Ok(result) => result,
            Err(err) => {
                log_warn!("inspection failed: {err}");
                inspector.empty_result()
            }
        }
    }
}
