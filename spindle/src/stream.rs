//! Streaming callback plumbing for completed thoughts.
//!
//! The flow invokes the callback on its own executing task, after the
//! thought has been appended to state, so observers always see a prefix of
//! the committed thought list. `channel_callback` bridges thoughts into
//! `thought_event` envelopes for the SSE collaborator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cot::ThoughtData;

/// Callback invoked with each completed thought, including the
/// supervisor-forced terminal one.
pub type ThoughtCallback = Arc<dyn Fn(&ThoughtData) + Send + Sync>;

/// Converts one thought into its wire event.
pub fn thought_to_event(thought: &ThoughtData) -> thought_event::ThoughtEvent {
    thought_event::ThoughtEvent::Thought {
        round: thought.thought_number,
        thinking: thought.current_thinking.clone(),
        plan: serde_json::to_value(&thought.planning).unwrap_or(serde_json::Value::Null),
        next_thought_needed: thought.next_thought_needed,
    }
}

/// Builds a callback that sends enveloped events over an unbounded channel.
///
/// The receiver side is typically drained by the SSE writer. Send failures
/// (receiver gone) are ignored; a disconnected client must not fail the
/// reasoning loop.
pub fn channel_callback(
    session_id: Option<String>,
    tx: mpsc::UnboundedSender<serde_json::Value>,
) -> ThoughtCallback {
    let seq = AtomicU64::new(1);
    Arc::new(move |thought: &ThoughtData| {
        let event = thought_to_event(thought);
        let mut state = thought_event::EnvelopeState::new(session_id.clone());
        state.next_event_id = seq.fetch_add(1, Ordering::Relaxed);
        if let Ok(value) = thought_event::to_json(&event, &mut state) {
            let _ = tx.send(value);
        }
    })
}
