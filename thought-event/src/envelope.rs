//! Envelope (session_id, event_id) injected into each stream event.
//! EnvelopeState hands out monotonically increasing event ids within a run.

use crate::event::ThoughtEvent;
use serde_json::Value;

/// Envelope fields attached to each message.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Session ID; constant within a session.
    pub session_id: Option<String>,
    /// Per-message sequence number; monotonically increasing within a stream.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.session_id {
            obj.entry("session_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("event_id")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one run: session_id plus the next event_id.
pub struct EnvelopeState {
    pub session_id: Option<String>,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            session_id,
            next_event_id: 1,
        }
    }

    /// Injects the envelope into the event value and advances the counter.
    pub fn inject_into(&mut self, value: &mut Value) {
        let mut env = Envelope::new().with_event_id(self.next_event_id);
        if let Some(ref id) = self.session_id {
            env = env.with_session_id(id);
        }
        self.next_event_id += 1;
        env.inject_into(value);
    }
}

/// Converts a thought event to JSON and injects the envelope from the state.
/// Returns the final value (type + payload + session_id, event_id).
pub fn to_json(
    event: &ThoughtEvent,
    state: &mut EnvelopeState,
) -> Result<Value, serde_json::Error> {
    let mut value = event.to_value()?;
    state.inject_into(&mut value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ThoughtEvent;

    #[test]
    fn envelope_inject() {
        let mut obj = serde_json::json!({"type":"thought","round":1});
        let env = Envelope::new().with_session_id("sess-1").with_event_id(1);
        env.inject_into(&mut obj);
        assert_eq!(obj["session_id"], "sess-1");
        assert_eq!(obj["event_id"], 1);
        assert_eq!(obj["type"], "thought");
    }

    #[test]
    fn to_json_injects_envelope_and_advances() {
        let ev = ThoughtEvent::Solution {
            round: 2,
            text: "答案是 2".to_string(),
        };
        let mut state = EnvelopeState::new(Some("sess-9".to_string()));
        let value = to_json(&ev, &mut state).unwrap();
        assert_eq!(value["type"], "solution");
        assert_eq!(value["text"], "答案是 2");
        assert_eq!(value["session_id"], "sess-9");
        assert_eq!(value["event_id"], 1);
        assert_eq!(state.next_event_id, 2);
    }

    #[test]
    fn anonymous_session_omits_session_id() {
        let ev = ThoughtEvent::Done;
        let mut state = EnvelopeState::new(None);
        let value = to_json(&ev, &mut state).unwrap();
        assert_eq!(value["type"], "done");
        assert!(value.get("session_id").is_none());
        assert_eq!(value["event_id"], 1);
    }
}
