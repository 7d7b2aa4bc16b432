use std::sync::Mutex;

use stagehand_core::protocol::Request;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no engine command configured")]
    NoEngine,
    #[error("failed to start engine {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine {0} pipe was not captured")]
    MissingPipe(&'static str),
    #[error("engine connection closed")]
    Closed,
}

/// Where the mirror's requests go. Sends are fire-and-forget: any answer
/// arrives later as a notification.
pub trait Service {
    fn send(&self, request: Request) -> Result<(), BridgeError>;

    fn send_all(&self, requests: Vec<Request>) -> Result<(), BridgeError> {
        for request in requests {
            self.send(request)?;
        }
        Ok(())
    }
}

/// In-memory service that keeps every request. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingService {
    sent: Mutex<Vec<Request>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the requests recorded so far.
    pub fn take(&self) -> Vec<Request> {
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *sent)
    }
}

impl Service for RecordingService {
    fn send(&self, request: Request) -> Result<(), BridgeError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        Ok(())
    }
}
