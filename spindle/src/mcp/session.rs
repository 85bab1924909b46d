//! MCP session over stdio: spawn the server process, perform the
//! initialize handshake, then request/response over newline-delimited
//! JSON-RPC. Handles `roots/list` requests from the server by answering
//! with empty roots; other server-initiated traffic is ignored.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::tools::ToolError;

use super::config::ServerConfig;

/// Protocol version sent in the initialize handshake.
pub const PROTOCOL_VERSION: &str = "2025-11-25";
/// Client identity sent in the initialize handshake.
pub const CLIENT_NAME: &str = "spindle-mcp";

const INITIALIZE_ID: &str = "spindle-mcp-initialize";
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(20);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn request_value(id: &str, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub(crate) fn notification_value(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

pub(crate) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "clientInfo": {
            "name": CLIENT_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcError {
    #[allow(dead_code)]
    pub code: i64,
    pub message: String,
}

/// Any incoming JSON-RPC message: response (result/error) or a
/// server-initiated request/notification (method).
#[derive(Debug, Deserialize)]
struct Incoming {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug)]
struct SessionIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// One connected stdio server.
#[derive(Debug)]
pub struct StdioSession {
    server: String,
    child: Mutex<Child>,
    io: Mutex<SessionIo>,
}

impl StdioSession {
    /// Spawns the server process and completes the initialize handshake.
    /// Handshake failure kills the child before surfacing the error.
    pub async fn connect(cfg: &ServerConfig) -> Result<Self, ToolError> {
        let mut child = Command::new(&cfg.command)
            .args(&cfg.args)
            .envs(&cfg.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Transport(format!("spawn {}: {}", cfg.command, e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Transport("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Transport("child stdout unavailable".to_string()))?;
        let session = Self {
            server: cfg.name.clone(),
            child: Mutex::new(child),
            io: Mutex::new(SessionIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
        };
        if let Err(e) = session.initialize().await {
            session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    async fn initialize(&self) -> Result<(), ToolError> {
        self.request_with_timeout(
            INITIALIZE_ID,
            "initialize",
            initialize_params(),
            INITIALIZE_TIMEOUT,
        )
        .await?;
        self.notify("notifications/initialized", json!({})).await
    }

    /// Sends one JSON-RPC request and waits for the matching result.
    pub async fn request(&self, id: &str, method: &str, params: Value) -> Result<Value, ToolError> {
        self.request_with_timeout(id, method, params, REQUEST_TIMEOUT)
            .await
    }

    async fn request_with_timeout(
        &self,
        id: &str,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ToolError> {
        let mut guard = self.io.lock().await;
        let io = &mut *guard;
        let line = serde_json::to_string(&request_value(id, method, params))
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        write_line(&mut io.stdin, &line).await?;

        let waited = tokio::time::timeout(timeout, async {
            loop {
                let line = io
                    .stdout
                    .next_line()
                    .await
                    .map_err(|e| ToolError::Transport(e.to_string()))?
                    .ok_or_else(|| {
                        ToolError::Transport(format!("{}: server closed stdout", self.server))
                    })?;
                if line.trim().is_empty() {
                    continue;
                }
                let msg: Incoming = match serde_json::from_str(&line) {
                    Ok(msg) => msg,
                    // Non-protocol output on stdout; skip it.
                    Err(_) => continue,
                };
                if let Some(server_method) = &msg.method {
                    if server_method == "roots/list" {
                        if let Some(req_id) = &msg.id {
                            let reply = json!({
                                "jsonrpc": "2.0",
                                "id": req_id,
                                "result": { "roots": [] }
                            });
                            write_line(&mut io.stdin, &reply.to_string()).await?;
                        }
                    }
                    continue;
                }
                if msg.id.as_ref().and_then(Value::as_str) == Some(id) {
                    if let Some(err) = msg.error {
                        return Err(ToolError::JsonRpc(err.message));
                    }
                    return Ok(msg.result.unwrap_or(Value::Null));
                }
            }
        })
        .await;
        match waited {
            Ok(result) => result,
            Err(_) => Err(ToolError::Transport(format!(
                "timeout waiting for {}",
                method
            ))),
        }
    }

    /// Sends a notification; no response expected.
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ToolError> {
        let mut guard = self.io.lock().await;
        let line = serde_json::to_string(&notification_value(method, params))
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        write_line(&mut guard.stdin, &line).await
    }

    /// Terminates the server process.
    pub async fn close(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            tracing::debug!(server = %self.server, error = %e, "kill on close");
        }
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> Result<(), ToolError> {
    stdin
        .write_all(line.as_bytes())
        .await
        .map_err(|e| ToolError::Transport(e.to_string()))?;
    stdin
        .write_all(b"\n")
        .await
        .map_err(|e| ToolError::Transport(e.to_string()))?;
    stdin
        .flush()
        .await
        .map_err(|e| ToolError::Transport(e.to_string()))
}
