//! The CoT node: one reasoning round per step, looping via a self-edge.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::flow::{Action, Node, RunContext};
use crate::llm::LlmClient;

use super::prompts::{build_messages, format_plan, format_thoughts, seed_plan};
use super::state::{PlanStep, ThinkingState, ThoughtData, STEP_DONE};
use super::supervisor::{self, Verdict};
use super::yaml::{extract_yaml_block, parse_thought};

/// Prep record for one round: everything exec needs to build the prompt.
#[derive(Clone, Debug)]
pub struct CotPrep {
    pub problem: String,
    pub history: String,
    pub thoughts_text: String,
    pub last_plan_text: String,
    pub round: u32,
    pub first_round: bool,
}

/// CoT reasoning node bound to the LLM collaborator.
pub struct CotNode {
    llm: Arc<dyn LlmClient>,
}

impl CotNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ThinkingState> for CotNode {
    type Prep = CotPrep;
    type Exec = ThoughtData;

    fn id(&self) -> &str {
        "cot"
    }

    fn prep(&self, state: &mut ThinkingState) -> Result<Vec<CotPrep>, AgentError> {
        state.round += 1;
        let first_round = state.thoughts.is_empty();
        let last_plan = state
            .thoughts
            .last()
            .map(|t| t.planning.clone())
            .unwrap_or_else(seed_plan);
        Ok(vec![CotPrep {
            problem: state.problem.clone(),
            history: state.history.clone(),
            thoughts_text: format_thoughts(&state.thoughts),
            last_plan_text: format_plan(&last_plan),
            round: state.round,
            first_round,
        }])
    }

    async fn exec(&self, ctx: &RunContext, prep: &CotPrep) -> Result<ThoughtData, AgentError> {
        let messages = build_messages(prep);
        let reply = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(AgentError::Cancelled),
            reply = self.llm.call(&messages) => reply?,
        };
        let yaml = extract_yaml_block(&reply.content)?;
        let mut thought = parse_thought(&yaml)?;
        thought.thought_number = prep.round;
        Ok(thought)
    }

    /// A failed round degrades to a terminal 结论 carrying the error, so the
    /// flow reaches a clean termination instead of crashing.
    fn exec_fallback(&self, prep: &CotPrep, err: AgentError) -> Result<ThoughtData, AgentError> {
        let message = err.to_string();
        Ok(ThoughtData {
            thought_number: prep.round,
            current_thinking: message.clone(),
            planning: vec![PlanStep {
                description: "结论".to_string(),
                status: STEP_DONE.to_string(),
                result: Some(message),
                ..PlanStep::default()
            }],
            next_thought_needed: false,
        })
    }

    fn post(
        &self,
        state: &mut ThinkingState,
        _prep: Vec<CotPrep>,
        results: Vec<ThoughtData>,
    ) -> Result<Action, AgentError> {
        let thought = results
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Flow("cot exec produced no thought".to_string()))?;
        state.thoughts.push(thought);
        // Committed before the callback fires: observers see a prefix of
        // the thought list.
        if let (Some(callback), Some(last)) = (&state.on_thought, state.thoughts.last()) {
            callback(last);
        }
        match supervisor::gate(state) {
            Verdict::End(solution) => {
                state.solution = solution;
                Ok(Action::End)
            }
            Verdict::Continue => Ok(Action::Continue),
        }
    }
}
