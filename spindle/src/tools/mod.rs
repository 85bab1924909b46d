//! Tool fabric: the `Tool` trait, the shared registry, and the built-in
//! reload tools.

mod registry;
mod reload;
mod r#trait;

pub use registry::ToolRegistry;
pub use reload::{McpReloadTool, SkillReloadTool, TOOL_MCP_RELOAD, TOOL_SKILL_RELOAD};
pub use r#trait::{Tool, ToolContext, ToolError, ToolResult};
