//! Silent supervisor: quality gate and loop guard for the CoT flow.
//!
//! Layered into the CoT node's post phase. Rejections are never errors;
//! they force another round without the caller noticing. The retry counter
//! lives in `ThinkingState`, so the budget is per-session.

use once_cell::sync::Lazy;
use regex::Regex;

use super::state::{PlanStep, ThinkingState};

/// Hard cap on reasoning rounds; reaching it forces termination.
pub const MAX_THOUGHTS: usize = 25;

/// Silent retries allowed before a rejected solution is force-accepted.
pub const MAX_SUPERVISOR_RETRIES: u8 = 2;

const APOLOGY: &str = "抱歉，经过多轮思考仍未得出有效结论。";

/// Refusal openers, anchored at the start: English sorry / cannot / unable
/// and the Chinese equivalents.
static REFUSAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(?:i[''’]?m\s+)?sorry").unwrap(),
        Regex::new(r"(?i)^\s*i\s+(?:cannot|can[''’]?t|am\s+unable|was\s+unable)").unwrap(),
        Regex::new(r"^\s*(?:抱歉|对不起|无法|不能)").unwrap(),
    ]
});

const ERROR_PREFIXES: &[&str] = &["[error]", "[错误]", "error:", "错误:", "failed:", "失败:"];

/// Tests whether a candidate solution is acceptable.
///
/// Rejects: fewer than 5 characters (rune-counted); fewer than 120
/// characters that open with a refusal; any length opening with an error
/// prefix (after lower-casing).
pub fn validate_solution(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    let runes = trimmed.chars().count();
    if runes < 5 {
        return false;
    }
    if runes < 120 && REFUSAL_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !ERROR_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Depth-first search for the first terminal conclusion result in a plan.
pub fn extract_conclusion_result(steps: &[PlanStep]) -> Option<String> {
    for step in steps {
        if step.is_conclusion() {
            return step.result.clone();
        }
        if let Some(found) = extract_conclusion_result(&step.sub_steps) {
            return Some(found);
        }
    }
    None
}

/// Best available solution for a forced or cancelled termination: the
/// latest conclusion result, else the latest thinking narrative, else a
/// canned apology.
pub fn extract_best_solution(state: &ThinkingState) -> String {
    for thought in state.thoughts.iter().rev() {
        if let Some(conclusion) = extract_conclusion_result(&thought.planning) {
            return conclusion;
        }
    }
    for thought in state.thoughts.iter().rev() {
        let narrative = thought.current_thinking.trim();
        if !narrative.is_empty() {
            return narrative.to_string();
        }
    }
    APOLOGY.to_string()
}

/// Supervisor verdict for one appended thought.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Not terminal (or rejected): run another round.
    Continue,
    /// Accept and stop with the given solution.
    End(String),
}

/// Gates the thought that was just appended to `state.thoughts`.
pub(crate) fn gate(state: &mut ThinkingState) -> Verdict {
    if state.thoughts.len() >= MAX_THOUGHTS {
        tracing::warn!(
            thoughts = state.thoughts.len(),
            "loop guard reached, forcing termination"
        );
        return Verdict::End(extract_best_solution(state));
    }

    let last = match state.thoughts.last() {
        Some(t) => t,
        None => return Verdict::Continue,
    };
    if last.next_thought_needed {
        return Verdict::Continue;
    }

    let candidate = extract_conclusion_result(&last.planning)
        .unwrap_or_else(|| last.current_thinking.trim().to_string());

    if validate_solution(&candidate) {
        return Verdict::End(candidate);
    }
    if state.supervisor_retries >= MAX_SUPERVISOR_RETRIES {
        tracing::debug!("supervisor retries exhausted, force-accepting solution");
        return Verdict::End(candidate);
    }
    state.supervisor_retries += 1;
    state.solution.clear();
    tracing::debug!(
        retries = state.supervisor_retries,
        "supervisor rejected solution, forcing another round"
    );
    Verdict::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cot::state::{ThoughtData, STEP_DONE};

    fn terminal_thought(round: u32, thinking: &str, conclusion: Option<&str>) -> ThoughtData {
        let planning = match conclusion {
            Some(result) => vec![PlanStep {
                description: "结论".to_string(),
                status: STEP_DONE.to_string(),
                result: Some(result.to_string()),
                ..PlanStep::default()
            }],
            None => vec![],
        };
        ThoughtData {
            thought_number: round,
            current_thinking: thinking.to_string(),
            planning,
            next_thought_needed: false,
        }
    }

    #[test]
    fn validate_rejects_short_strings_by_rune_count() {
        // 4 runes, 12 bytes: rejected because runes are counted, not bytes.
        assert!(!validate_solution("答案是二"));
        assert!(validate_solution("答案是四十二"));
        assert!(!validate_solution("ab c"));
    }

    #[test]
    fn validate_rejects_short_refusals_but_not_long_ones() {
        assert!(!validate_solution("Sorry, I cannot answer."));
        assert!(!validate_solution("抱歉，我无法回答这个问题。"));
        assert!(!validate_solution("I cannot help with that."));
        let long = format!("Sorry for the long preamble. {}", "详细解答。".repeat(30));
        assert!(validate_solution(&long));
    }

    #[test]
    fn validate_rejects_error_prefixes_case_insensitively() {
        assert!(!validate_solution("Error: something broke badly"));
        assert!(!validate_solution("[ERROR] upstream unavailable"));
        assert!(!validate_solution("失败:无法完成推理任务"));
        assert!(validate_solution("结果正常：答案是 42。"));
    }

    #[test]
    fn conclusion_search_is_recursive() {
        let plan = vec![PlanStep {
            description: "分析".to_string(),
            status: "Pending".to_string(),
            sub_steps: vec![PlanStep {
                description: "Conclusion".to_string(),
                status: "Done".to_string(),
                result: Some("nested answer".to_string()),
                ..PlanStep::default()
            }],
            ..PlanStep::default()
        }];
        assert_eq!(
            extract_conclusion_result(&plan).as_deref(),
            Some("nested answer")
        );
    }

    #[test]
    fn best_solution_prefers_latest_conclusion_then_narrative() {
        let mut state = ThinkingState::new("q");
        state
            .thoughts
            .push(terminal_thought(1, "first narrative", Some("old answer")));
        state.thoughts.push(terminal_thought(2, "newer narrative", None));
        assert_eq!(extract_best_solution(&state), "old answer");

        let mut narrative_only = ThinkingState::new("q");
        narrative_only
            .thoughts
            .push(terminal_thought(1, "only narrative", None));
        assert_eq!(extract_best_solution(&narrative_only), "only narrative");

        let empty = ThinkingState::new("q");
        assert_eq!(extract_best_solution(&empty), APOLOGY);
    }

    #[test]
    fn gate_rejects_refusal_then_force_accepts_on_third() {
        let mut state = ThinkingState::new("q");
        for expected_retries in 1..=MAX_SUPERVISOR_RETRIES {
            state
                .thoughts
                .push(terminal_thought(1, "Sorry, I cannot answer.", None));
            assert_eq!(gate(&mut state), Verdict::Continue);
            assert_eq!(state.supervisor_retries, expected_retries);
        }
        state
            .thoughts
            .push(terminal_thought(3, "Sorry, I cannot answer.", None));
        match gate(&mut state) {
            Verdict::End(solution) => assert_eq!(solution, "Sorry, I cannot answer."),
            v => panic!("expected forced End, got {:?}", v),
        }
    }

    #[test]
    fn gate_loop_guard_fires_at_max_thoughts() {
        let mut state = ThinkingState::new("q");
        for round in 1..=MAX_THOUGHTS as u32 {
            state.thoughts.push(ThoughtData {
                thought_number: round,
                current_thinking: format!("round {}", round),
                planning: vec![],
                next_thought_needed: true,
            });
        }
        match gate(&mut state) {
            Verdict::End(solution) => assert_eq!(solution, "round 25"),
            v => panic!("expected End from loop guard, got {:?}", v),
        }
    }
}
