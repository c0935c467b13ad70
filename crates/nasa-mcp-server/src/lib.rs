pub mod config;
pub mod dispatch;
pub mod health;
pub mod mcp;
pub mod protocol;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{build_router, start, AppState, ServerHandle};
pub use shutdown::ShutdownCoordinator;
