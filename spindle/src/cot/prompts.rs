//! Prompt assembly for the CoT node: system prompt, thought/plan renderers,
//! and the per-round message builder.

use crate::message::Message;

use super::node::CotPrep;
use super::state::{PlanStep, ThoughtData};

/// System prompt for the reasoning loop. The response contract (fenced YAML
/// with current_thinking / planning / next_thought_needed) is what
/// `extract_yaml_block` and `parse_thought` expect.
pub const COT_SYSTEM_PROMPT: &str = r#"你是一个逐步推理的助手。每一轮，阅读问题、此前的思考与最新计划，然后产出一轮新的思考。

Respond with exactly one fenced YAML document:

```yaml
current_thinking: |
  本轮的思考叙述。
planning:
  - description: 理解问题
    status: Done
    result: ...
  - description: 结论
    status: Pending
next_thought_needed: true
```

Rules:
- status is one of: Pending, Done, Verification Needed.
- When the answer is final, set the 结论 step to Done with the answer in its
  result, and set next_thought_needed: false.
- Steps may carry sub_steps for decomposition.
"#;

/// Seed plan used for the first round.
pub fn seed_plan() -> Vec<PlanStep> {
    vec![
        PlanStep::pending("理解问题"),
        PlanStep::pending("制定方案"),
        PlanStep::pending("结论"),
    ]
}

/// Renders one plan tree as an indented checklist.
pub fn format_plan(steps: &[PlanStep]) -> String {
    let mut out = String::new();
    format_plan_into(steps, 0, &mut out);
    out
}

fn format_plan_into(steps: &[PlanStep], depth: usize, out: &mut String) {
    for step in steps {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("- [");
        out.push_str(if step.status.is_empty() {
            "Pending"
        } else {
            &step.status
        });
        out.push_str("] ");
        out.push_str(&step.description);
        if let Some(result) = step.result.as_deref().filter(|r| !r.is_empty()) {
            out.push_str(" => ");
            out.push_str(result);
        }
        if let Some(mark) = step.mark.as_deref().filter(|m| !m.is_empty()) {
            out.push_str(" (");
            out.push_str(mark);
            out.push(')');
        }
        out.push('\n');
        format_plan_into(&step.sub_steps, depth + 1, out);
    }
}

/// Renders the preceding thoughts for the prompt.
pub fn format_thoughts(thoughts: &[ThoughtData]) -> String {
    let mut out = String::new();
    for t in thoughts {
        out.push_str(&format!("### 第 {} 轮\n{}\n", t.thought_number, t.current_thinking.trim()));
    }
    out
}

/// Builds the messages for one round.
pub fn build_messages(prep: &CotPrep) -> Vec<Message> {
    let mut user = String::new();
    if !prep.history.is_empty() {
        user.push_str("## 会话历史\n");
        user.push_str(&prep.history);
        user.push('\n');
    }
    user.push_str("## 问题\n");
    user.push_str(&prep.problem);
    user.push('\n');
    if prep.first_round {
        user.push_str("\n这是第 1 轮思考。\n");
    } else {
        user.push_str(&format!("\n## 此前的思考\n{}", prep.thoughts_text));
        user.push_str(&format!("\n这是第 {} 轮思考。\n", prep.round));
    }
    user.push_str("\n## 最新计划\n");
    user.push_str(&prep.last_plan_text);
    vec![Message::system(COT_SYSTEM_PROMPT), Message::user(user)]
}
