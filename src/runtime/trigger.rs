use crate::trace::log_debug;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::net::TcpStream;

/// Destination of the summary message for one trigger.
pub trait Responder: Send {
    fn respond(&mut self, message: &str) -> io::Result<()>;

    /// Peer description for logs.
    fn peer(&self) -> String {
        "client".to_string()
    }
}

impl Responder for TcpStream {
    fn respond(&mut self, message: &str) -> io::Result<()> {
        self.write_all(message.as_bytes())?;
        self.flush()
    }

    fn peer(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "disconnected peer".to_string())
    }
}

/// Single-slot trigger: armed while it holds a responder.
///
/// The flag and the responder are one value, so they can only be set and
/// cleared together.
#[derive(Default)]
pub struct TriggerSlot {
    armed: Mutex<Option<Box<dyn Responder>>>,
}

impl TriggerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the trigger. When already armed the responder is handed back.
    pub fn arm(&self, responder: Box<dyn Responder>) -> Result<(), Box<dyn Responder>> {
        let mut slot = self.armed.lock();
        if slot.is_some() {
            return Err(responder);
        }
        log_debug!("trigger armed by {}", responder.peer());
        *slot = Some(responder);
        Ok(())
    }

    pub fn is_armed(&self) -> bool {
        self.armed.lock().is_some()
    }

    /// Sends `message` to the armed responder without disarming.
    ///
    /// The slot stays locked during the write, so responders must bound
    /// their writes (the trigger server sets a socket write timeout).
    pub fn respond(&self, message: &str) -> io::Result<()> {
        match self.armed.lock().as_mut() {
            Some(responder) => responder.respond(message),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "trigger is not armed",
            )),
        }
    }

    /// Disarms and drops the responder, closing its connection.
    /// Returns whether the trigger was armed.
    pub fn release(&self) -> bool {
        self.armed.lock().take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Responder, TriggerSlot};
    use std::io;
    use std::sync::mpsc;

    struct Channel(mpsc::Sender<String>);

    impl Responder for Channel {
        fn respond(&mut self, message: &str) -> io::Result<()> {
            self.0
                .send(message.to_string())
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn second_arm_is_refused_until_release() {
        let (tx, rx) = mpsc::channel();
        let slot = TriggerSlot::new();
        assert!(slot.arm(Box::new(Channel(tx.clone()))).is_ok());
        assert!(slot.arm(Box::new(Channel(tx))).is_err());
        slot.respond("1,2,3.00").unwrap();
        assert!(slot.is_armed());
        assert_eq!(rx.recv().unwrap(), "1,2,3.00");
        assert!(slot.release());
        assert!(!slot.is_armed());
        assert!(!slot.release());
    }

    #[test]
    fn respond_without_trigger_fails() {
        let slot = TriggerSlot::new();
        let err = slot.respond("x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
