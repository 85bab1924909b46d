//! Adapters that expose remote MCP tools through the local `Tool` trait.
//!
//! One adapter per remote tool, registered under `mcp_<server>__<tool>`.
//! The double underscore separates server from tool unambiguously even
//! when both contain single underscores.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{Tool, ToolContext, ToolError, ToolRegistry, ToolResult};

use super::client::{McpClient, ToolInfo};

/// Composes the registry name for a remote tool.
pub fn compose_name(server: &str, tool: &str) -> String {
    format!("mcp_{}__{}", server, tool)
}

/// One remote tool behind the `Tool` trait.
pub struct McpToolAdapter {
    name: String,
    remote_name: String,
    description: String,
    input_schema: Value,
    client: Arc<McpClient>,
}

impl McpToolAdapter {
    pub fn new(server: &str, info: ToolInfo, client: Arc<McpClient>) -> Self {
        let input_schema = if info.input_schema.is_null() {
            // Servers may omit the schema; advertise a valid empty one.
            json!({ "type": "object", "properties": {} })
        } else {
            info.input_schema
        };
        Self {
            name: compose_name(server, &info.name),
            remote_name: info.name,
            description: info.description,
            input_schema,
            client,
        }
    }
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    /// Forwards arguments verbatim. Tool-level errors come back in the
    /// result's error field; only transport failures are `Err`.
    async fn execute(
        &self,
        args: Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        tokio::select! {
            _ = ctx.cancel.cancelled() => Err(ToolError::Cancelled),
            result = self.client.call_tool(&self.remote_name, args) => result,
        }
    }
}

/// Lists a server's tools and registers one adapter per tool.
/// Returns the registered names so the manager can unregister them later.
pub async fn register_server_tools(
    registry: &ToolRegistry,
    server: &str,
    client: &Arc<McpClient>,
) -> Result<Vec<String>, ToolError> {
    let infos = client.list_tools().await?;
    let mut names = Vec::with_capacity(infos.len());
    for info in infos {
        let adapter = McpToolAdapter::new(server, info, Arc::clone(client));
        names.push(adapter.name().to_string());
        registry.register(Arc::new(adapter));
    }
    Ok(names)
}
