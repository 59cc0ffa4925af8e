use crate::camera::CameraHandle;
use crate::inspect::InspectOptions;
use crate::runtime::{
    AutoMachine, CameraWorker, LoopHandle, ProcessMode, ResultSink, ServerConfig, SharedState,
    TeachLoop, TriggerServer, TriggerSlot,
};
use crate::trace::log_info;
use crate::util::MarkAlignResult;
use std::net::SocketAddr;
use std::sync::Arc;

/// Which loop a [`Session`] is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Teaching,
    Auto,
}

enum Active {
    Idle,
    Teaching {
        teach: LoopHandle,
        camera: Option<LoopHandle>,
    },
    Auto {
        server: TriggerServer,
        machine: LoopHandle,
    },
}

/// Owns the running mode. Starting one mode stops the other first, and
/// dropping the session stops whatever is running.
pub struct Session {
    shared: Arc<SharedState>,
    trigger: Arc<TriggerSlot>,
    sink: Arc<dyn ResultSink>,
    opts: InspectOptions,
    server: ServerConfig,
    active: Active,
}

impl Session {
    pub fn new(shared: Arc<SharedState>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            shared,
            trigger: Arc::new(TriggerSlot::new()),
            sink,
            opts: InspectOptions::default(),
            server: ServerConfig::default(),
            active: Active::Idle,
        }
    }

    pub fn with_server_config(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    pub fn with_options(mut self, opts: InspectOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn trigger(&self) -> &Arc<TriggerSlot> {
        &self.trigger
    }

    pub fn mode(&self) -> Mode {
        match self.active {
            Active::Idle => Mode::Idle,
            Active::Teaching { .. } => Mode::Teaching,
            Active::Auto { .. } => Mode::Auto,
        }
    }

    /// Address of the trigger listener while in automatic mode.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        match &self.active {
            Active::Auto { server, .. } => Some(server.local_addr()),
            _ => None,
        }
    }

    /// Starts the teaching loop. With a camera, a worker keeps the shared
    /// frame fresh; without one, the loop processes whatever frame is set.
    pub fn start_teaching(
        &mut self,
        mode: ProcessMode,
        camera: Option<CameraHandle>,
    ) -> MarkAlignResult<()> {
        self.stop();
        let camera = match camera {
            Some(camera) => Some(CameraWorker::new(camera, Arc::clone(&self.shared)).spawn()?),
            None => None,
        };
        let teach = TeachLoop::new(Arc::clone(&self.shared), Arc::clone(&self.sink), mode)
            .with_options(self.opts.clone())
            .spawn()?;
        self.active = Active::Teaching { teach, camera };
        log_info!("session switched to teaching ({})", mode.name());
        Ok(())
    }

    /// Binds the trigger listener and starts the automatic machine.
    /// A bind failure leaves the session idle.
    pub fn start_auto(&mut self, camera: CameraHandle) -> MarkAlignResult<SocketAddr> {
        self.stop();
        let server = TriggerServer::bind(&self.server, Arc::clone(&self.trigger))?;
        let machine = AutoMachine::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.trigger),
            camera,
            Arc::clone(&self.sink),
        )
        .with_options(self.opts.clone())
        .spawn()?;
        let addr = server.local_addr();
        self.active = Active::Auto { server, machine };
        log_info!("session switched to auto on {addr}");
        Ok(addr)
    }

    /// Stops the running mode, if any, and waits for its threads.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.active, Active::Idle) {
            Active::Idle => {}
            Active::Teaching { teach, camera } => {
                teach.stop();
                if let Some(camera) = camera {
                    camera.stop();
                }
                log_info!("teaching stopped");
            }
            Active::Auto { server, machine } => {
                server.stop();
                machine.stop();
                log_info!("auto stopped");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
