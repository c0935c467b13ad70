pub mod events;
pub mod registry;
pub mod session;

pub use events::{EventLog, LogEntry, ReplayError, DEFAULT_LOG_CAPACITY};
pub use registry::{RegistryConfig, SessionRegistry};
pub use session::Session;
