//! CotRunner: wires the CoT node into a self-looping flow, seeds state from
//! the session collaborator, runs to completion, and persists the exchange.

use std::sync::Arc;

use crate::error::AgentError;
use crate::flow::{Action, Flow, RunContext};
use crate::llm::LlmClient;
use crate::session::{SessionStore, Turn};
use crate::stream::ThoughtCallback;

use super::node::CotNode;
use super::state::ThinkingState;
use super::supervisor::extract_best_solution;

/// Exec attempts per round before the fallback thought is used.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Builds and runs CoT flows over one LLM and session collaborator pair.
pub struct CotRunner {
    llm: Arc<dyn LlmClient>,
    sessions: Arc<dyn SessionStore>,
    max_attempts: u32,
}

impl CotRunner {
    pub fn new(llm: Arc<dyn LlmClient>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            llm,
            sessions,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Runs one reasoning loop and returns the final state.
    ///
    /// `state.solution` holds the accepted answer; `state.thoughts` the full
    /// round history. When a session id is given, the history prefix is
    /// pulled before the run and the problem/solution pair appended after.
    pub async fn run(
        &self,
        ctx: &RunContext,
        problem: &str,
        session_id: Option<&str>,
        on_thought: Option<ThoughtCallback>,
    ) -> Result<ThinkingState, AgentError> {
        let history = match session_id {
            Some(id) => {
                let (turns, summary) = self.sessions.session_context(id).await?;
                format_history(&turns, &summary)
            }
            None => String::new(),
        };

        let mut state = ThinkingState::new(problem).with_history(history);
        state.on_thought = on_thought;

        let mut flow = Flow::new("cot").with_max_attempts(self.max_attempts);
        flow.add_node("cot", Arc::new(CotNode::new(Arc::clone(&self.llm))));
        flow.add_edge("cot", Action::Continue, "cot");
        flow.run(ctx, &mut state).await?;

        // Cancellation can stop the flow between rounds with no accepted
        // solution; salvage the best one we have.
        if state.solution.is_empty() {
            state.solution = extract_best_solution(&state);
        }

        if let Some(id) = session_id {
            self.sessions.append_turn(id, Turn::user(problem)).await?;
            self.sessions
                .append_turn(id, Turn::assistant(state.solution.clone()))
                .await?;
        }
        tracing::info!(
            rounds = state.thoughts.len(),
            session = session_id.unwrap_or("-"),
            "reasoning run finished"
        );
        Ok(state)
    }
}

fn format_history(turns: &[Turn], summary: &str) -> String {
    let mut out = String::new();
    if !summary.trim().is_empty() {
        out.push_str("摘要: ");
        out.push_str(summary.trim());
        out.push('\n');
    }
    for turn in turns {
        out.push_str(&turn.role);
        out.push_str(": ");
        out.push_str(&turn.content);
        out.push('\n');
    }
    out
}
