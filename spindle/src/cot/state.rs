//! State types for the CoT flow: thoughts, reasoning plan steps, and the
//! shared `ThinkingState` the flow mutates between rounds.

use serde::{Deserialize, Serialize};

use crate::stream::ThoughtCallback;

/// Step status emitted by the LLM for a reasoning plan step.
///
/// Kept as loose strings because the plan is LLM-authored; the canonical
/// values are `Pending`, `Done`, and `Verification Needed`.
pub const STEP_PENDING: &str = "Pending";
pub const STEP_DONE: &str = "Done";
pub const STEP_VERIFICATION_NEEDED: &str = "Verification Needed";

/// The step description that marks a terminal conclusion, in both the
/// English form (matched case-insensitively) and the Chinese form
/// (matched exactly).
pub const CONCLUSION_EN: &str = "conclusion";
pub const CONCLUSION_ZH: &str = "结论";

/// One node of the recursive reasoning plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_steps: Vec<PlanStep>,
}

impl PlanStep {
    pub fn pending(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: STEP_PENDING.to_string(),
            ..Self::default()
        }
    }

    /// True when this step is a terminal conclusion candidate: description
    /// matches `Conclusion` (any case) or `结论` exactly, status is Done,
    /// and a non-empty result is present.
    pub fn is_conclusion(&self) -> bool {
        let desc = self.description.trim();
        let named = desc.eq_ignore_ascii_case(CONCLUSION_EN) || desc == CONCLUSION_ZH;
        named
            && self.status.trim().eq_ignore_ascii_case(STEP_DONE)
            && self
                .result
                .as_deref()
                .map(|r| !r.trim().is_empty())
                .unwrap_or(false)
    }
}

/// One reasoning round. Created by the flow after each successful LLM call;
/// never mutated after append.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThoughtData {
    /// Monotonically increasing round number, stamped from prep.
    #[serde(default)]
    pub thought_number: u32,
    pub current_thinking: String,
    #[serde(default)]
    pub planning: Vec<PlanStep>,
    #[serde(default)]
    pub next_thought_needed: bool,
}

/// Shared flow state for one reasoning run. Mutated only by the flow,
/// serially between rounds.
#[derive(Default)]
pub struct ThinkingState {
    pub problem: String,
    /// Conversation-history prefix folded into the prompt.
    pub history: String,
    pub thoughts: Vec<ThoughtData>,
    pub round: u32,
    pub solution: String,
    pub on_thought: Option<ThoughtCallback>,
    /// Silent supervisor retry counter; per-session by construction since
    /// each run owns its state.
    pub(crate) supervisor_retries: u8,
}

impl ThinkingState {
    pub fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = history.into();
        self
    }

    pub fn with_callback(mut self, callback: ThoughtCallback) -> Self {
        self.on_thought = Some(callback);
        self
    }
}

impl std::fmt::Debug for ThinkingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThinkingState")
            .field("problem", &self.problem)
            .field("thoughts", &self.thoughts.len())
            .field("round", &self.round)
            .field("solution", &self.solution)
            .field("supervisor_retries", &self.supervisor_retries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conclusion_requires_done_status_and_result() {
        let mut step = PlanStep::pending(CONCLUSION_ZH);
        assert!(!step.is_conclusion());
        step.status = STEP_DONE.to_string();
        assert!(!step.is_conclusion());
        step.result = Some("答案是 2".to_string());
        assert!(step.is_conclusion());
    }

    #[test]
    fn conclusion_matches_english_case_insensitively() {
        let step = PlanStep {
            description: "CONCLUSION".to_string(),
            status: "done".to_string(),
            result: Some("42".to_string()),
            ..PlanStep::default()
        };
        assert!(step.is_conclusion());
    }

    #[test]
    fn non_conclusion_description_is_rejected() {
        let step = PlanStep {
            description: "结论与总结".to_string(),
            status: STEP_DONE.to_string(),
            result: Some("x".to_string()),
            ..PlanStep::default()
        };
        assert!(!step.is_conclusion());
    }
}
