//! MCP session over the event-stream transport: POST single JSON-RPC
//! messages to a base URL, accept both `application/json` and
//! `text/event-stream` response bodies, and carry the server-assigned
//! `MCP-Session-Id` on subsequent requests.

use std::sync::Mutex;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::ToolError;

use super::config::ServerConfig;
use super::session::{
    initialize_params, notification_value, request_value, PROTOCOL_VERSION,
};

const INITIALIZE_ID: &str = "spindle-mcp-initialize";

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

/// JSON-RPC response body (result or error).
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    #[allow(dead_code)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

/// Parses a JSON-RPC response from an HTTP body. Supports both a plain
/// JSON object and an SSE body (`data:` lines carrying JSON-RPC messages);
/// returns the first message with a result or error.
fn parse_json_rpc_from_body(
    body: &str,
    content_type: Option<&str>,
) -> Result<JsonRpcResponse, ToolError> {
    let is_sse = content_type
        .map(|s| s.contains("text/event-stream"))
        .unwrap_or(false);
    if !is_sse {
        return serde_json::from_str(body)
            .map_err(|e| ToolError::Transport(format!("response json: {}", e)));
    }

    let mut data_buffer = String::new();
    let try_parse = |buffer: &str| -> Option<JsonRpcResponse> {
        serde_json::from_str::<JsonRpcResponse>(buffer)
            .ok()
            .filter(|r| r.result.is_some() || r.error.is_some())
    };
    for line in body.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            if data.is_empty() || data == "[DONE]" {
                if let Some(r) = try_parse(&data_buffer) {
                    return Ok(r);
                }
                data_buffer.clear();
                continue;
            }
            if !data_buffer.is_empty() {
                data_buffer.push('\n');
            }
            data_buffer.push_str(data);
            if let Some(r) = try_parse(&data_buffer) {
                return Ok(r);
            }
        } else if line.trim().is_empty() {
            if let Some(r) = try_parse(&data_buffer) {
                return Ok(r);
            }
            data_buffer.clear();
        }
    }
    if let Some(r) = try_parse(&data_buffer) {
        return Ok(r);
    }
    Err(ToolError::Transport(
        "SSE stream: no JSON-RPC response (result/error) found".to_string(),
    ))
}

/// One connected event-stream server.
pub struct SseSession {
    client: Client,
    url: String,
    /// Session id from the server's MCP-Session-Id header; echoed back on
    /// subsequent requests.
    session_id: Mutex<Option<String>>,
}

impl SseSession {
    /// Builds the HTTP client and completes the initialize handshake.
    pub async fn connect(cfg: &ServerConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        let session = Self {
            client,
            url: cfg.url.clone(),
            session_id: Mutex::new(None),
        };
        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&self) -> Result<(), ToolError> {
        let body = request_value(INITIALIZE_ID, "initialize", initialize_params());
        let resp = self
            .post(&body)
            .await
            .map_err(|e| ToolError::Transport(format!("initialize: {}", e)))?;
        let status = resp.status();
        if let Some(id) = resp
            .headers()
            .get("MCP-Session-Id")
            .and_then(|v| v.to_str().ok())
        {
            *self
                .session_id
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(id.to_string());
        }
        if status != reqwest::StatusCode::ACCEPTED {
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(ToolError::Transport(format!(
                    "initialize HTTP {}: {}",
                    status,
                    if text.is_empty() { "no body" } else { &text }
                )));
            }
            let content_type = resp
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let text = resp
                .text()
                .await
                .map_err(|e| ToolError::Transport(format!("initialize body: {}", e)))?;
            let reply = parse_json_rpc_from_body(&text, content_type.as_deref())?;
            if let Some(err) = reply.error {
                return Err(ToolError::Transport(format!("initialize: {}", err.message)));
            }
        }

        let notification = notification_value("notifications/initialized", json!({}));
        let resp = self
            .post(&notification)
            .await
            .map_err(|e| ToolError::Transport(format!("initialized notification: {}", e)))?;
        let status = resp.status();
        if status != reqwest::StatusCode::ACCEPTED && !status.is_success() {
            return Err(ToolError::Transport(format!(
                "notifications/initialized HTTP {}",
                status
            )));
        }
        Ok(())
    }

    /// Sends one JSON-RPC request (one POST, one response).
    pub async fn request(&self, id: &str, method: &str, params: Value) -> Result<Value, ToolError> {
        let body = request_value(id, method, params);
        let resp = self
            .post(&body)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ToolError::Transport(format!(
                "{} HTTP {}: {}",
                method,
                status,
                if text.is_empty() { "no body" } else { &text }
            )));
        }
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let text = resp
            .text()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        let reply = parse_json_rpc_from_body(&text, content_type.as_deref())?;
        if let Some(err) = reply.error {
            return Err(ToolError::JsonRpc(err.message));
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, reqwest::Error> {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("MCP-Protocol-Version", PROTOCOL_VERSION)
            .json(body);
        let session_id = self
            .session_id
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(id) = session_id {
            req = req.header("MCP-Session-Id", id);
        }
        req.send().await
    }

    /// Nothing to tear down for HTTP; sessions are per-request.
    pub async fn close(&self) {}
}
