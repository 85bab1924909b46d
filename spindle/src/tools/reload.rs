//! Built-in hot-reload tools: `skill_reload` and `mcp_reload`.
//!
//! Both take no arguments and return the human-readable reload summary in
//! their output field. Reload failures are tool-level failures, so they
//! land in the error field rather than aborting the agent's turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::mcp::McpManager;
use crate::skills::SkillManager;

use super::r#trait::{Tool, ToolContext, ToolError, ToolResult};

pub const TOOL_SKILL_RELOAD: &str = "skill_reload";
pub const TOOL_MCP_RELOAD: &str = "mcp_reload";

fn empty_schema() -> serde_json::Value {
    json!({ "type": "object", "properties": {} })
}

/// Rescans workspace skills and applies the diff.
pub struct SkillReloadTool {
    manager: Arc<SkillManager>,
}

impl SkillReloadTool {
    pub fn new(manager: Arc<SkillManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SkillReloadTool {
    fn name(&self) -> &str {
        TOOL_SKILL_RELOAD
    }

    fn description(&self) -> &str {
        "Rescan the workspace skills directory, recompile go skills, and apply \
         additions, removals, and updates to the tool registry."
    }

    fn input_schema(&self) -> serde_json::Value {
        empty_schema()
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        match self.manager.reload().await {
            Ok(summary) => Ok(ToolResult::ok(summary.to_string())),
            Err(e) => Ok(ToolResult::err(e.to_string())),
        }
    }
}

/// Re-reads mcp.json and applies the server diff.
pub struct McpReloadTool {
    manager: Arc<McpManager>,
}

impl McpReloadTool {
    pub fn new(manager: Arc<McpManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for McpReloadTool {
    fn name(&self) -> &str {
        TOOL_MCP_RELOAD
    }

    fn description(&self) -> &str {
        "Re-read mcp.json, close removed servers, and connect and register \
         new or changed ones. Stdio servers backed by scripts pass the \
         safety scanner first."
    }

    fn input_schema(&self) -> serde_json::Value {
        empty_schema()
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        match self.manager.reload().await {
            Ok(summary) => Ok(ToolResult::ok(summary.to_string())),
            Err(e) => Ok(ToolResult::err(e.to_string())),
        }
    }
}
