//! Session collaborator: conversation history per session id.
//!
//! The runtime does not persist agent state across restarts; history lives
//! in memory behind this trait. The CoT runner pulls the context before a
//! run and appends the user problem and final solution after it.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;

/// One conversation turn as stored by the session collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Session store contract: ordered turns plus an optional rolling summary.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the turns and summary for a session. Unknown sessions return
    /// an empty context, not an error.
    async fn session_context(&self, id: &str) -> Result<(Vec<Turn>, String), AgentError>;

    async fn append_turn(&self, id: &str, turn: Turn) -> Result<(), AgentError>;
}

/// In-memory session store. No summarisation; the summary is always empty.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn session_context(&self, id: &str) -> Result<(Vec<Turn>, String), AgentError> {
        let sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok((sessions.get(id).cloned().unwrap_or_default(), String::new()))
    }

    async fn append_turn(&self, id: &str, turn: Turn) -> Result<(), AgentError> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.entry(id.to_string()).or_default().push(turn);
        Ok(())
    }
}
