pub mod config;
pub mod connection;
pub mod contract;
pub mod metrics_server;
pub mod observability;
pub mod tools;
pub mod transport;

pub use connection::{ConnectionManager, ConnectionState};
pub use tools::{CallToolResult, ToolDispatcher, ToolError};
pub use transport::{router, AppState, ServerIdentity};
