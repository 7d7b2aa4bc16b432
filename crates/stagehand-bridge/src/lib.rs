pub mod process;
pub mod service;

pub use process::{EngineCommand, EngineProcess};
pub use service::{BridgeError, RecordingService, Service};
