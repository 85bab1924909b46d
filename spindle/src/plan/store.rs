//! Plan store: session id → ordered plan steps, with a checklist renderer.
//!
//! Distinct from the reasoning plan inside thoughts: these steps are flat,
//! carry string ids, and belong to a session. The rendered footer names the
//! next actionable step to deter the LLM from re-issuing a plan that
//! already exists.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Closed status set; anything else renders as pending.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_DONE: &str = "done";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_SKIPPED: &str = "skipped";

/// One step of a session execution plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlanStep {
    /// Unique within the session's plan.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detail: String,
}

impl SessionPlanStep {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: String::new(),
            detail: String::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    fn glyph(&self) -> &'static str {
        match self.status.as_str() {
            STATUS_IN_PROGRESS => "[→]",
            STATUS_DONE => "[x]",
            STATUS_ERROR => "[!]",
            STATUS_SKIPPED => "[-]",
            // pending, empty, and unknown statuses all render the same
            _ => "[ ]",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), STATUS_DONE | STATUS_SKIPPED)
    }
}

/// Thread-safe store of per-session plans.
#[derive(Default)]
pub struct PlanStore {
    plans: Mutex<HashMap<String, Vec<SessionPlanStep>>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire plan for a session. The input is copied and
    /// empty statuses are filled with `pending`.
    pub fn set(&self, session_id: &str, steps: &[SessionPlanStep]) {
        let mut copy: Vec<SessionPlanStep> = steps.to_vec();
        for step in &mut copy {
            if step.status.is_empty() {
                step.status = STATUS_PENDING.to_string();
            }
        }
        self.lock().insert(session_id.to_string(), copy);
    }

    /// Mutates one step by id. Returns false if the session or step is
    /// absent. An empty detail leaves the existing detail untouched.
    pub fn update(&self, session_id: &str, step_id: &str, status: &str, detail: &str) -> bool {
        let mut plans = self.lock();
        let Some(steps) = plans.get_mut(session_id) else {
            return false;
        };
        let Some(step) = steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        step.status = status.to_string();
        if !detail.is_empty() {
            step.detail = detail.to_string();
        }
        true
    }

    /// Returns a defensive copy of the session's plan.
    pub fn get(&self, session_id: &str) -> Option<Vec<SessionPlanStep>> {
        self.lock().get(session_id).cloned()
    }

    pub fn delete(&self, session_id: &str) {
        self.lock().remove(session_id);
    }

    /// Renders the plan as a Markdown checklist plus a progress footer.
    pub fn render(&self, session_id: &str) -> Option<String> {
        let steps = self.get(session_id)?;
        let mut out = String::from("## 执行计划\n");
        for step in &steps {
            out.push_str(&format!("- {} {}: {}\n", step.glyph(), step.id, step.title));
        }
        let done = steps.iter().filter(|s| s.status == STATUS_DONE).count();
        let next = steps.iter().find(|s| !s.is_terminal());
        out.push('\n');
        match next {
            Some(step) => out.push_str(&format!(
                "> ⚡ 计划已设置（{}/{} 完成）。下一步：用实际工具执行 {}（不是 update_plan）。\n",
                done,
                steps.len(),
                step.id
            )),
            None => out.push_str(&format!(
                "> ⚡ 计划已完成（{}/{} 完成）。\n",
                done,
                steps.len()
            )),
        }
        Some(out)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<SessionPlanStep>>> {
        self.plans
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
