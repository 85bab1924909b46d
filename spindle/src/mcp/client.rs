//! MCP client: one connected server, either transport, behind a
//! reader-writer lock so concurrent list/call requests proceed while
//! close or reconnect takes the writer side.

use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::tools::{ToolError, ToolResult};

use super::config::{ServerConfig, Transport};
use super::session::StdioSession;
use super::sse::SseSession;

/// Remote tool metadata from `tools/list`.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// Opaque schema document; `Value::Null` when the server omitted it.
    pub input_schema: Value,
}

enum SessionKind {
    Stdio(StdioSession),
    Sse(SseSession),
}

impl SessionKind {
    async fn request(&self, id: &str, method: &str, params: Value) -> Result<Value, ToolError> {
        match self {
            SessionKind::Stdio(s) => s.request(id, method, params).await,
            SessionKind::Sse(s) => s.request(id, method, params).await,
        }
    }

    async fn close(&self) {
        match self {
            SessionKind::Stdio(s) => s.close().await,
            SessionKind::Sse(s) => s.close().await,
        }
    }
}

/// A connected MCP server.
pub struct McpClient {
    name: String,
    inner: RwLock<Option<SessionKind>>,
}

impl McpClient {
    /// Connects per the server config and completes the handshake.
    pub async fn connect(cfg: &ServerConfig) -> Result<Self, ToolError> {
        let session = match cfg.transport {
            Transport::Stdio => SessionKind::Stdio(StdioSession::connect(cfg).await?),
            Transport::Sse => SessionKind::Sse(SseSession::connect(cfg).await?),
        };
        tracing::debug!(server = %cfg.name, "mcp server connected");
        Ok(Self {
            name: cfg.name.clone(),
            inner: RwLock::new(Some(session)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lists the server's tools.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, ToolError> {
        let guard = self.inner.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ToolError::Transport(format!("{}: client closed", self.name)))?;
        let result = session
            .request("spindle-tools-list", "tools/list", json!({}))
            .await?;
        parse_list_tools(result)
    }

    /// Calls one tool. A tool-level error (`isError`) lands in the result's
    /// error field; transport failures are `Err`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        let guard = self.inner.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ToolError::Transport(format!("{}: client closed", self.name)))?;
        let id = format!("spindle-call-{}", name);
        let params = json!({ "name": name, "arguments": arguments });
        let result = session.request(&id, "tools/call", params).await?;
        Ok(parse_call_tool(result))
    }

    /// Closes the connection; in-flight requests finish first because
    /// close waits on the writer side of the lock.
    pub async fn close(&self) {
        let mut guard = self.inner.write().await;
        if let Some(session) = guard.take() {
            session.close().await;
            tracing::debug!(server = %self.name, "mcp server closed");
        }
    }
}

/// Parses a `tools/list` result.
fn parse_list_tools(result: Value) -> Result<Vec<ToolInfo>, ToolError> {
    let tools = result
        .get("tools")
        .ok_or_else(|| ToolError::Transport("no tools in response".to_string()))?
        .as_array()
        .ok_or_else(|| ToolError::Transport("tools not an array".to_string()))?;
    let mut infos = Vec::with_capacity(tools.len());
    for tool in tools {
        let obj = tool
            .as_object()
            .ok_or_else(|| ToolError::Transport("tool item not an object".to_string()))?;
        infos.push(ToolInfo {
            name: obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            input_schema: obj.get("inputSchema").cloned().unwrap_or(Value::Null),
        });
    }
    Ok(infos)
}

/// Parses a `tools/call` result into the tool-result record.
fn parse_call_tool(result: Value) -> ToolResult {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    if result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return ToolResult::err(if text.is_empty() {
            "tool returned error".to_string()
        } else {
            text
        });
    }
    if text.is_empty() {
        if let Some(structured) = result.get("structuredContent") {
            return ToolResult::ok(structured.to_string());
        }
    }
    ToolResult::ok(text)
}
