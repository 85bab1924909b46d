//! Tests for the skill stdio envelope: one request line in, one response
//! line out, protocol failures mapped to the tool's error field, and
//! cancellation terminating the subprocess.
//!
//! The happy-path skills are small /bin/sh scripts, so these tests are
//! unix-only.

#![cfg(unix)]


use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::json;
use tokio_util::sync::CancellationToken;

use spindle::skills::{SkillDef, SkillRuntime, SkillTool};
use spindle::{Tool, ToolContext, ToolError};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn binary_skill(dir: &Path, entry: &str) -> SkillDef {
    SkillDef {
        name: "echo".to_string(),
        description: "echoes the msg argument".to_string(),
        runtime: SkillRuntime::Binary,
        entry: entry.to_string(),
        parameters: vec![],
        docs: None,
        dir: dir.to_path_buf(),
    }
}

/// **Scenario**: the skill echoes back `hello <msg>`; empty args yield
/// `hello ` with an empty error.
#[tokio::test]
async fn envelope_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "run.sh",
        r#"#!/bin/sh
read line
msg=$(printf '%s' "$line" | sed -n 's/.*"msg":"\([^"]*\)".*/\1/p')
printf '{"output":"hello %s","error":""}\n' "$msg"
"#,
    );
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));

    let result = tool
        .execute(json!({"msg": "world"}), &ToolContext::new())
        .await
        .unwrap();
    assert_eq!(result.output, "hello world");
    assert!(result.error.is_empty());

    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert_eq!(result.output, "hello ");
    assert!(result.error.is_empty());
}

/// The child's error field passes through untouched.
#[tokio::test]
async fn skill_error_envelope_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "run.sh",
        r#"#!/bin/sh
read line
printf '{"output":"","error":"bad arguments"}\n'
"#,
    );
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));
    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert!(result.output.is_empty());
    assert_eq!(result.error, "bad arguments");
}

/// Empty stdout is a distinct protocol failure.
#[tokio::test]
async fn empty_stdout_is_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "run.sh", "#!/bin/sh\nread line\nexit 0\n");
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));
    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert!(result.error.contains("produced no output"), "{:?}", result);
}

/// Non-JSON stdout is a distinct protocol failure.
#[tokio::test]
async fn malformed_json_is_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "run.sh",
        "#!/bin/sh\nread line\necho not json at all\n",
    );
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));
    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert!(result.error.contains("malformed JSON"), "{:?}", result);
}

/// A missing entry binary fails at spawn with its own message.
#[tokio::test]
async fn spawn_failure_is_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    let tool = SkillTool::new(binary_skill(dir.path(), "no_such_entry_xyz"));
    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert!(
        result.error.contains("failed to start skill process"),
        "{:?}",
        result
    );
}

/// Cancellation terminates the subprocess instead of waiting it out.
#[tokio::test]
async fn cancellation_kills_subprocess() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "run.sh",
        "#!/bin/sh\nread line\nsleep 30\nprintf '{\"output\":\"late\",\"error\":\"\"}\\n'\n",
    );
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));

    let cancel = CancellationToken::new();
    let ctx = ToolContext {
        cancel: cancel.clone(),
    };
    let handle = tokio::spawn(async move { tool.execute(json!({}), &ctx).await });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    cancel.cancel();

    let started = std::time::Instant::now();
    let result = handle.await.unwrap();
    assert!(matches!(result, Err(ToolError::Cancelled)));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

/// Stderr does not pollute the envelope.
#[tokio::test]
async fn stderr_is_separated_from_envelope() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "run.sh",
        r#"#!/bin/sh
read line
echo "debug noise" >&2
printf '{"output":"clean","error":""}\n'
"#,
    );
    let tool = SkillTool::new(binary_skill(dir.path(), "run.sh"));
    let result = tool.execute(json!({}), &ToolContext::new()).await.unwrap();
    assert_eq!(result.output, "clean");
}
