//! Event types for the thought stream (type + payload).
//! The plan tree is carried as `serde_json::Value`; the bridge in spindle
//! serializes its recursive plan steps into that.

use serde::Serialize;
use serde_json::Value;

/// One stream event: wire shape is a tagged object (`type` + payload).
/// Envelope fields (session_id, event_id) are applied separately.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThoughtEvent {
    /// One completed reasoning round.
    Thought {
        round: u32,
        thinking: String,
        plan: Value,
        next_thought_needed: bool,
    },
    /// The accepted final answer for the run.
    Solution { round: u32, text: String },
    /// End of stream for this run.
    Done,
}

impl ThoughtEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
