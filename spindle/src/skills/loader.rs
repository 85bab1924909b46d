//! Workspace scan: find, parse, and validate `skills/<dir>/skill.yaml`.
//!
//! Tolerant of partial failure: a missing `skills/` directory is an empty result, a
//! sub-directory without `skill.yaml` is silently skipped, and a descriptor
//! that fails to parse or validate becomes a per-skill warning while the
//! remaining skills continue to load.

use std::path::Path;

use crate::error::AgentError;

use super::types::SkillDef;

/// Name of the per-skill descriptor file.
pub const SKILL_FILENAME: &str = "skill.yaml";

/// Result of one workspace scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub skills: Vec<SkillDef>,
    /// Per-skill problems, keyed by directory name in the message.
    pub warnings: Vec<String>,
}

/// Scans `<workspace>/skills/` for skill descriptors.
pub fn scan_workspace(workspace: &Path) -> Result<ScanOutcome, AgentError> {
    let skills_dir = workspace.join("skills");
    let mut outcome = ScanOutcome::default();
    if !skills_dir.is_dir() {
        return Ok(outcome);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&skills_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let dir = entry.path();
        let dir_name = entry.file_name().to_string_lossy().to_string();
        let descriptor = dir.join(SKILL_FILENAME);
        if !descriptor.is_file() {
            continue;
        }
        let raw = match std::fs::read_to_string(&descriptor) {
            Ok(raw) => raw,
            Err(e) => {
                outcome.warnings.push(format!("{}: {}", dir_name, e));
                continue;
            }
        };
        let mut def: SkillDef = match serde_yaml::from_str(&raw) {
            Ok(def) => def,
            Err(e) => {
                outcome.warnings.push(format!("{}: {}", dir_name, e));
                continue;
            }
        };
        if let Err(problem) = validate(&def, &dir_name) {
            outcome.warnings.push(format!("{}: {}", dir_name, problem));
            continue;
        }
        def.dir = dir;
        tracing::debug!(skill = %def.name, dir = %dir_name, "scanned skill");
        outcome.skills.push(def);
    }
    Ok(outcome)
}

/// Validates a parsed descriptor against its directory.
///
/// The tool name must equal the directory name or start with `<dir>_`, so
/// registry names stay traceable to their workspace directory.
fn validate(def: &SkillDef, dir_name: &str) -> Result<(), String> {
    if def.name.trim().is_empty() {
        return Err("missing name".to_string());
    }
    if def.description.trim().is_empty() {
        return Err("missing description".to_string());
    }
    if def.entry.trim().is_empty() {
        return Err("missing entry".to_string());
    }
    if def.name != dir_name && !def.name.starts_with(&format!("{}_", dir_name)) {
        return Err(format!(
            "skill name '{}' must equal directory '{}' or start with '{}_'",
            def.name, dir_name, dir_name
        ));
    }
    Ok(())
}
