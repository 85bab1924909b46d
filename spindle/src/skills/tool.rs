//! Skill invocation: one subprocess per call, stdio JSON envelope.
//!
//! Request line `{"arguments": <object>}` then stdin closes; the child
//! answers with exactly one line `{"output": <string>, "error": <string>}`.
//! The working directory is the skill directory. Protocol failures are
//! tool-level failures (they ride in `ToolResult::error`); only
//! cancellation surfaces as a transport error.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::compile::binary_path;
use super::types::{SkillDef, SkillRuntime};

/// Response envelope the child writes to stdout.
#[derive(Debug, Deserialize)]
struct SkillEnvelope {
    #[serde(default)]
    output: String,
    #[serde(default)]
    error: String,
}

/// Reads a child pipe to the end on its own task.
fn drain_pipe<R>(pipe: Option<R>) -> tokio::task::JoinHandle<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            use tokio::io::AsyncReadExt;
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    })
}

fn pipe_to_string(joined: Result<Vec<u8>, tokio::task::JoinError>) -> String {
    String::from_utf8_lossy(&joined.unwrap_or_default()).to_string()
}

/// A workspace skill registered as a callable tool.
pub struct SkillTool {
    def: SkillDef,
}

impl SkillTool {
    pub fn new(def: SkillDef) -> Self {
        Self { def }
    }

    pub fn def(&self) -> &SkillDef {
        &self.def
    }

    /// Program and arguments for the skill's runtime.
    fn command_line(&self) -> (PathBuf, Vec<String>) {
        match self.def.runtime {
            SkillRuntime::Python => ("python3".into(), vec![self.def.entry.clone()]),
            SkillRuntime::Node => ("node".into(), vec![self.def.entry.clone()]),
            SkillRuntime::Go => (binary_path(&self.def), vec![]),
            SkillRuntime::Binary => {
                let local = self.def.dir.join(&self.def.entry);
                if local.exists() {
                    (local, vec![])
                } else {
                    (self.def.entry.clone().into(), vec![])
                }
            }
        }
    }
}

#[async_trait]
impl Tool for SkillTool {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn description(&self) -> &str {
        &self.def.description
    }

    fn input_schema(&self) -> serde_json::Value {
        self.def.input_schema()
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let (program, prog_args) = self.command_line();
        let mut child = match tokio::process::Command::new(&program)
            .args(&prog_args)
            .current_dir(&self.def.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return Ok(ToolResult::err(format!(
                    "failed to start skill process: {}",
                    e
                )))
            }
        };

        let request = match serde_json::to_string(&json!({ "arguments": args })) {
            Ok(line) => line,
            Err(e) => {
                return Ok(ToolResult::err(format!(
                    "failed to encode skill arguments: {}",
                    e
                )))
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let mut line = request.into_bytes();
            line.push(b'\n');
            // A child that exits before reading produces a broken pipe;
            // the envelope (or lack of it) decides the outcome below.
            let _ = stdin.write_all(&line).await;
            let _ = stdin.shutdown().await;
        }

        // Drain both pipes concurrently with the wait so a chatty child
        // cannot deadlock on a full pipe buffer.
        let stdout_task = drain_pipe(child.stdout.take());
        let stderr_task = drain_pipe(child.stderr.take());

        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                tracing::debug!(skill = %self.def.name, "skill invocation cancelled");
                return Err(ToolError::Cancelled);
            }
            status = child.wait() => {
                if let Err(e) = status {
                    return Ok(ToolResult::err(format!(
                        "failed to wait for skill process: {}",
                        e
                    )));
                }
            }
        }

        let stderr = pipe_to_string(stderr_task.await);
        if !stderr.trim().is_empty() {
            tracing::debug!(skill = %self.def.name, stderr = %stderr.trim(), "skill stderr");
        }

        let stdout = pipe_to_string(stdout_task.await);
        let line = stdout.lines().find(|l| !l.trim().is_empty());
        let Some(line) = line else {
            return Ok(ToolResult::err(format!(
                "skill '{}' produced no output",
                self.def.name
            )));
        };
        match serde_json::from_str::<SkillEnvelope>(line) {
            // A reported error wins over any output so the result record
            // never carries both.
            Ok(envelope) if !envelope.error.is_empty() => Ok(ToolResult::err(envelope.error)),
            Ok(envelope) => Ok(ToolResult::ok(envelope.output)),
            Err(e) => Ok(ToolResult::err(format!(
                "skill '{}' returned malformed JSON: {}",
                self.def.name, e
            ))),
        }
    }
}
