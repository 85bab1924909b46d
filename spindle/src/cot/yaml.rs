//! YAML extraction and thought parsing for LLM responses.
//!
//! The model is asked for a fenced YAML document; extraction recognises, in
//! order, a fence tagged `yaml`, a plain fence, and finally the whole
//! response as raw YAML. An opening fence with no closing fence is an error.

use serde::Deserialize;

use crate::error::AgentError;

use super::state::{PlanStep, ThoughtData};

const FENCE: &str = "```";
const YAML_FENCE: &str = "```yaml";

/// Extracts the YAML document from an LLM response.
pub fn extract_yaml_block(response: &str) -> Result<String, AgentError> {
    if let Some(start) = response.find(YAML_FENCE) {
        let body = &response[start + YAML_FENCE.len()..];
        return match body.find(FENCE) {
            Some(end) => Ok(body[..end].trim().to_string()),
            None => Err(AgentError::Parse(
                "unterminated ```yaml fence in response".to_string(),
            )),
        };
    }
    if let Some(start) = response.find(FENCE) {
        let body = &response[start + FENCE.len()..];
        return match body.find(FENCE) {
            Some(end) => Ok(body[..end].trim().to_string()),
            None => Err(AgentError::Parse(
                "unterminated ``` fence in response".to_string(),
            )),
        };
    }
    Ok(response.trim().to_string())
}

/// Raw document shape; presence checks happen before defaults apply.
#[derive(Deserialize)]
struct RawThought {
    #[serde(default)]
    current_thinking: Option<String>,
    #[serde(default)]
    planning: Option<Vec<PlanStep>>,
    #[serde(default)]
    next_thought_needed: Option<bool>,
}

/// Parses a YAML document into a `ThoughtData`.
///
/// Requires `current_thinking` non-empty and `planning` present; an empty
/// planning list is accepted (conclusion extraction then falls back to the
/// thinking narrative). The round number is stamped by the caller.
pub fn parse_thought(yaml: &str) -> Result<ThoughtData, AgentError> {
    let raw: RawThought =
        serde_yaml::from_str(yaml).map_err(|e| AgentError::Parse(format!("thought yaml: {}", e)))?;
    let current_thinking = raw.current_thinking.unwrap_or_default();
    if current_thinking.trim().is_empty() {
        return Err(AgentError::Validation(
            "current_thinking is missing or empty".to_string(),
        ));
    }
    let planning = raw
        .planning
        .ok_or_else(|| AgentError::Validation("planning is missing".to_string()))?;
    Ok(ThoughtData {
        thought_number: 0,
        current_thinking,
        planning,
        next_thought_needed: raw.next_thought_needed.unwrap_or(false),
    })
}
