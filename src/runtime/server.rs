use crate::runtime::{LoopHandle, TriggerSlot};
use crate::trace::{log_debug, log_info, log_warn};
use crate::util::{MarkAlignError, MarkAlignResult};
use std::io::{self, ErrorKind, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Upper bound of one trigger request; longer requests are truncated.
pub const MAX_REQUEST_BYTES: usize = 1024;

/// Trigger listener settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Time allowed for a client to send its request.
    pub read_timeout: Duration,
    /// Time allowed for the reply write; bounds how long the armed trigger
    /// can be held by a client that stopped reading.
    pub write_timeout: Duration,
    /// Sleep between accept polls while idle.
    pub accept_poll: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
            accept_poll: Duration::from_millis(10),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// True when `request` is the case-insensitive trigger word.
pub fn is_trigger_request(request: &str) -> bool {
    request.trim().eq_ignore_ascii_case("check")
}

/// TCP listener that arms a [`TriggerSlot`] for every `check` request.
///
/// Clients are served one at a time. An accepted connection whose request
/// arms the trigger stays open until the reply is sent; any other
/// connection is closed right after its request is read.
pub struct TriggerServer {
    local_addr: SocketAddr,
    handle: LoopHandle,
}

impl TriggerServer {
    /// Binds the listener and starts accepting on a background thread.
    pub fn bind(cfg: &ServerConfig, trigger: Arc<TriggerSlot>) -> MarkAlignResult<Self> {
        let addr = cfg.address();
        let listener = TcpListener::bind(addr.as_str()).map_err(|err| MarkAlignError::Bind {
            addr: addr.clone(),
            reason: err.to_string(),
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let cfg = cfg.clone();
        let handle = LoopHandle::spawn("trigger-server", move |stop| {
            serve(&listener, &trigger, &cfg, stop)
        })?;
        log_info!("trigger server listening on {local_addr}");
        Ok(Self { local_addr, handle })
    }

    /// Bound address; useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Stops accepting and closes the listener.
    pub fn stop(self) {
        self.handle.stop();
    }
}

fn serve(listener: &TcpListener, trigger: &TriggerSlot, cfg: &ServerConfig, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => handle_client(stream, peer, trigger, cfg),
            Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(cfg.accept_poll),
            Err(err) => {
                log_warn!("accept failed: {err}");
                thread::sleep(cfg.accept_poll);
            }
        }
    }
    log_info!("trigger server stopped");
}

/// Blocking mode with both timeouts set.
fn configure(stream: &TcpStream, cfg: &ServerConfig) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(cfg.read_timeout))?;
    stream.set_write_timeout(Some(cfg.write_timeout))
}

fn handle_client(mut stream: TcpStream, peer: SocketAddr, trigger: &TriggerSlot, cfg: &ServerConfig) {
    if let Err(err) = configure(&stream, cfg) {
        log_warn!("cannot configure connection from {peer}: {err}");
        return;
    }
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let n = match stream.read(&mut buf) {
        Ok(0) => {
            log_debug!("{peer} disconnected without a request");
            return;
        }
        Ok(n) => n,
        Err(err) => {
            log_warn!("read from {peer} failed: {err}");
            return;
        }
    };
    let text = String::from_utf8_lossy(&buf[..n]);
    let request = text.trim();
    log_info!("received {request:?} from {peer}");
    if !is_trigger_request(request) {
        log_debug!("ignoring request from {peer}");
        return;
    }
    if trigger.arm(Box::new(stream)).is_err() {
        log_warn!("trigger already armed; dropping request from {peer}");
    }
}
