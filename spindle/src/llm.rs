//! LLM client abstraction for the CoT node.
//!
//! The node depends on a single call that turns role-tagged messages into
//! assistant text; this module defines the trait and a scripted mock. The
//! real HTTP client lives with the embedding application, not here.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

/// Reply from one LLM completion.
///
/// **Interaction**: Returned by `LlmClient::call`; the CoT node extracts a
/// YAML document from `content` and parses it into a `ThoughtData`.
#[derive(Clone, Debug, Default)]
pub struct LlmReply {
    /// Assistant message content (plain text, usually containing a fenced
    /// YAML block).
    pub content: String,
}

/// LLM client: given messages, returns assistant text.
///
/// Cancellation is handled by the caller (the CoT node races the call
/// against its `RunContext` token), so implementations only need to be
/// cancel-safe, not cancel-aware.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn call(&self, messages: &[Message]) -> Result<LlmReply, AgentError>;
}

/// Scripted LLM for tests and offline runs.
///
/// Replies are played back in order; once the script is exhausted the last
/// reply repeats, so a looping flow keeps receiving a terminal answer
/// instead of erroring.
pub struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl MockLlm {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(String::new()),
        }
    }

    /// Single fixed reply for every call.
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn call(&self, _messages: &[Message]) -> Result<LlmReply, AgentError> {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let content = match replies.pop_front() {
            Some(r) => {
                *self
                    .last
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner) = r.clone();
                r
            }
            None => self
                .last
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone(),
        };
        if content.is_empty() {
            return Err(AgentError::Llm("mock has no scripted reply".to_string()));
        }
        Ok(LlmReply { content })
    }
}

/// LLM that always fails; used to exercise retry and fallback paths.
pub struct FailingLlm {
    pub message: String,
}

#[async_trait]
impl LlmClient for FailingLlm {
    async fn call(&self, _messages: &[Message]) -> Result<LlmReply, AgentError> {
        Err(AgentError::Llm(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_plays_script_then_repeats_last() {
        let llm = MockLlm::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(llm.call(&[]).await.unwrap().content, "one");
        assert_eq!(llm.call(&[]).await.unwrap().content, "two");
        assert_eq!(llm.call(&[]).await.unwrap().content, "two");
    }

    #[tokio::test]
    async fn empty_mock_errors() {
        let llm = MockLlm::new(vec![]);
        assert!(matches!(llm.call(&[]).await, Err(AgentError::Llm(_))));
    }
}
