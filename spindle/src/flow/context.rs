//! Per-run context threaded through `Node::exec`.

use tokio_util::sync::CancellationToken;

/// Context for one flow run.
///
/// Carries the caller's cancellation token; every suspension point (LLM
/// call, subprocess wait, MCP request) races against it. A cancelled token
/// makes `exec` return `AgentError::Cancelled`, which skips retries and
/// goes straight to `exec_fallback` so the flow terminates cleanly.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}
