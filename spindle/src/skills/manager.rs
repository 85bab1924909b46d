//! Skill manager: lifecycle of workspace skills against the tool registry.
//!
//! `load_all` runs at startup (lazy go compile); `reload` re-scans, always
//! recompiles go skills, and applies an add/remove/update diff to the
//! registry. Partial success is the norm: per-skill failures become
//! warnings in the summary and keep any previously registered version
//! intact.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::AgentError;
use crate::tools::ToolRegistry;

use super::compile::compile_go;
use super::loader::scan_workspace;
use super::tool::SkillTool;
use super::types::SkillDef;

/// Human-readable diff of one reload.
#[derive(Debug, Default)]
pub struct SkillReloadSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub warnings: Vec<String>,
}

impl std::fmt::Display for SkillReloadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "skill reload: +{} -{} ~{}",
            self.added.len(),
            self.removed.len(),
            self.updated.len()
        )?;
        if !self.added.is_empty() {
            writeln!(f, "  added: {}", self.added.join(", "))?;
        }
        if !self.removed.is_empty() {
            writeln!(f, "  removed: {}", self.removed.join(", "))?;
        }
        if !self.updated.is_empty() {
            writeln!(f, "  updated: {}", self.updated.join(", "))?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        Ok(())
    }
}

/// Owns the workspace skill map; registers invocable tools into the shared
/// registry.
pub struct SkillManager {
    workspace: PathBuf,
    registry: Arc<ToolRegistry>,
    skills: Mutex<HashMap<String, SkillDef>>,
}

impl SkillManager {
    pub fn new(workspace: impl Into<PathBuf>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            workspace: workspace.into(),
            registry,
            skills: Mutex::new(HashMap::new()),
        }
    }

    /// Names of currently loaded skills.
    pub fn skill_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Startup load: scan once, compile go skills only when their binary is
    /// missing, register everything that survived.
    pub async fn load_all(&self) -> Result<SkillReloadSummary, AgentError> {
        self.apply(false).await
    }

    /// Hot reload: re-scan and always recompile go skills so source edits
    /// take effect, then diff against the current skill map.
    pub async fn reload(&self) -> Result<SkillReloadSummary, AgentError> {
        self.apply(true).await
    }

    async fn apply(&self, force_compile: bool) -> Result<SkillReloadSummary, AgentError> {
        // Scan and compile outside the lock; only the diff mutates state.
        let outcome = scan_workspace(&self.workspace)?;
        let mut summary = SkillReloadSummary {
            warnings: outcome.warnings,
            ..SkillReloadSummary::default()
        };

        let mut survivors: Vec<SkillDef> = Vec::with_capacity(outcome.skills.len());
        // Skills that failed to compile stay off the registry diff entirely:
        // any previously registered version remains intact.
        let mut compile_failed: Vec<String> = Vec::new();
        for def in outcome.skills {
            match compile_go(&def, force_compile).await {
                Ok(()) => survivors.push(def),
                Err(problem) => {
                    summary.warnings.push(format!("{}: {}", def.name, problem));
                    compile_failed.push(def.name);
                }
            }
        }

        {
            let mut skills = self.lock();
            let mut scanned: Vec<String> = survivors.iter().map(|d| d.name.clone()).collect();
            scanned.extend(compile_failed);
            let stale: Vec<String> = skills
                .keys()
                .filter(|name| !scanned.contains(*name))
                .cloned()
                .collect();
            for name in stale {
                skills.remove(&name);
                self.registry.unregister(&name);
                summary.removed.push(name);
            }
            for def in survivors {
                let name = def.name.clone();
                if skills.contains_key(&name) {
                    summary.updated.push(name.clone());
                } else {
                    summary.added.push(name.clone());
                }
                // Unconditional replace; this is what makes reload hot.
                self.registry.register(Arc::new(SkillTool::new(def.clone())));
                skills.insert(name, def);
            }
        }
        summary.added.sort();
        summary.removed.sort();
        summary.updated.sort();
        tracing::info!(
            added = summary.added.len(),
            removed = summary.removed.len(),
            updated = summary.updated.len(),
            warnings = summary.warnings.len(),
            "skill reload applied"
        );
        Ok(summary)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SkillDef>> {
        self.skills
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
