pub mod catalog;
pub mod dispatch;

pub use catalog::{list_tools, ToolDescriptor, ToolName};
pub use dispatch::{CallToolResult, ToolDispatcher, ToolError};
