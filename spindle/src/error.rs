//! Shared error type for the runtime.
//!
//! One enum covers the flow engine, the CoT node, and the managers; tool-level
//! failures do NOT use this type (they ride in `ToolResult::error`, see
//! `tools::ToolError` for the transport side).

use thiserror::Error;

/// Errors surfaced by flows, nodes, and manager operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM collaborator failure (network, quota, model error).
    #[error("llm: {0}")]
    Llm(String),

    /// The LLM response could not be turned into a thought (fence or YAML).
    #[error("parse: {0}")]
    Parse(String),

    /// A parsed thought failed validation (empty thinking, missing planning).
    #[error("validation: {0}")]
    Validation(String),

    /// Flow wiring problems: unknown node id, missing start node.
    #[error("flow: {0}")]
    Flow(String),

    /// Session collaborator failure.
    #[error("session: {0}")]
    Session(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The caller's cancellation token fired during a suspension point.
    #[error("cancelled")]
    Cancelled,
}
