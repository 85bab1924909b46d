//! Compilation of `go` runtime skills.
//!
//! The binary lands next to the descriptor (`skill` / `skill.exe`).
//! Startup compiles lazily so build errors surface early without paying a
//! rebuild on every launch; hot reload always recompiles so source edits
//! take effect.

use std::path::PathBuf;

use super::types::{SkillDef, SkillRuntime};

/// Platform-appropriate binary filename.
pub fn binary_name() -> &'static str {
    if cfg!(windows) {
        "skill.exe"
    } else {
        "skill"
    }
}

/// Path the compiled binary is written to.
pub fn binary_path(def: &SkillDef) -> PathBuf {
    def.dir.join(binary_name())
}

/// Compiles a go skill. `force` rebuilds even when the binary exists.
///
/// Non-go runtimes are a no-op. Errors are returned as strings so the
/// manager can fold them into the reload summary without aborting peers.
pub async fn compile_go(def: &SkillDef, force: bool) -> Result<(), String> {
    if def.runtime != SkillRuntime::Go {
        return Ok(());
    }
    let out = binary_path(def);
    if !force && out.exists() {
        return Ok(());
    }
    tracing::debug!(skill = %def.name, entry = %def.entry, "compiling go skill");
    let output = tokio::process::Command::new("go")
        .arg("build")
        .arg("-o")
        .arg(&out)
        .arg(&def.entry)
        .current_dir(&def.dir)
        .output()
        .await
        .map_err(|e| format!("go build failed to start: {}", e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("go build failed: {}", stderr.trim()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(runtime: SkillRuntime, dir: &std::path::Path) -> SkillDef {
        SkillDef {
            name: "x".to_string(),
            description: "d".to_string(),
            runtime,
            entry: "main.go".to_string(),
            parameters: vec![],
            docs: None,
            dir: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn non_go_runtime_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        compile_go(&def(SkillRuntime::Python, dir.path()), true)
            .await
            .unwrap();
    }

    /// Lazy mode skips the build when the binary already exists.
    #[tokio::test]
    async fn existing_binary_skips_lazy_compile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(binary_name()), b"stale").unwrap();
        compile_go(&def(SkillRuntime::Go, dir.path()), false)
            .await
            .unwrap();
    }
}
