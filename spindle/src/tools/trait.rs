//! The `Tool` trait and its call-level types.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors on the transport side of a tool call: the arguments never reached
/// the tool, or the tool's channel broke. Tool-level failures (a skill
/// writing an error envelope, an MCP tool reporting `isError`) ride in
/// `ToolResult::error` instead.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("json-rpc: {0}")]
    JsonRpc(String),
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("cancelled")]
    Cancelled,
}

/// Result of one tool execution. Exactly one of `output` / `error` is
/// populated; never both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolResult {
    pub output: String,
    pub error: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Per-call context. Carries the caller's cancellation token, which
/// long-running tools (skill subprocesses, MCP requests) must honour.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A callable tool in the registry.
///
/// Implementations: skill subprocess wrappers, MCP adapters, and the
/// built-in reload tools. All are registered into the same `ToolRegistry`
/// and invoked by higher-level agent logic.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable unique name used as the registry key.
    fn name(&self) -> &str;

    /// Human description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON schema for the arguments object.
    fn input_schema(&self) -> serde_json::Value;

    /// Executes with raw JSON arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError>;

    /// Lifecycle hook called after registration.
    async fn init(&self) -> Result<(), ToolError> {
        Ok(())
    }

    /// Lifecycle hook called before unregistration or shutdown.
    async fn close(&self) {}
}
