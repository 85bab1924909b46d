//! Remote MCP servers: config, transports, client, adapters, and the
//! hot-reloading manager with its safety gate.

mod adapter;
mod client;
mod config;
mod manager;
mod session;
mod sse;

pub use adapter::{compose_name, register_server_tools, McpToolAdapter};
pub use client::{McpClient, ToolInfo};
pub use config::{load_config, ServerConfig, Transport};
pub use manager::{McpManager, McpReloadSummary};
pub use session::{StdioSession, CLIENT_NAME, PROTOCOL_VERSION};
pub use sse::SseSession;
