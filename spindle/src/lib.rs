//! # Spindle
//!
//! A Chain-of-Thought agent runtime: an LLM-driven reasoning loop on a
//! minimal flow engine, plus a pluggable tool fabric of workspace skills
//! and remote MCP servers.
//!
//! ## Design
//!
//! - **Flow engine**: nodes have a Prep/Exec/Post lifecycle over one shared
//!   state type; a [`Flow`] follows `(node, action)` edges, self-edges
//!   included. Exec failures retry and then degrade via `exec_fallback`.
//! - **CoT loop**: [`CotNode`] runs one reasoning round per step (prompt →
//!   LLM → fenced YAML → [`ThoughtData`]), looping on itself until the
//!   model declares the answer final and an invisible supervisor agrees.
//! - **Supervisor**: [`cot::supervisor`] validates candidate solutions,
//!   silently forces extra rounds (at most two per session), and caps runs
//!   at 25 thoughts.
//! - **Skills**: workspace tools under `skills/<dir>/skill.yaml`, invoked
//!   as subprocesses over a one-line stdio JSON envelope, hot-reloaded by
//!   [`SkillManager`].
//! - **MCP**: remote tool servers from `mcp.json` over stdio or an
//!   event-stream transport, registered as `mcp_<server>__<tool>` adapters
//!   by [`McpManager`]. Script-backed stdio servers pass the
//!   [`scanner`] safety gate first; critical findings block activation.
//! - **Registry**: one [`ToolRegistry`] shared by both managers; register
//!   replaces silently, which is what makes reload hot.
//!
//! ## Collaborators
//!
//! The LLM HTTP client, the session history store, and the SSE channel are
//! external; they meet the runtime at [`LlmClient`], [`SessionStore`], and
//! the thought callback ([`stream`]).

pub mod cot;
pub mod error;
pub mod flow;
pub mod llm;
pub mod mcp;
pub mod message;
pub mod plan;
pub mod scanner;
pub mod session;
pub mod skills;
pub mod stream;
pub mod tools;

pub use cot::{CotNode, CotRunner, PlanStep, ThinkingState, ThoughtData};
pub use error::AgentError;
pub use flow::{Action, Flow, Node, RunContext, StepNode};
pub use llm::{LlmClient, LlmReply, MockLlm};
pub use mcp::{McpClient, McpManager, McpReloadSummary, McpToolAdapter, ServerConfig};
pub use message::Message;
pub use plan::{PlanStore, SessionPlanStep};
pub use scanner::{has_critical, scan_file, ScanFinding, Severity};
pub use session::{InMemorySessionStore, SessionStore, Turn};
pub use skills::{SkillDef, SkillManager, SkillReloadSummary, SkillRuntime, SkillTool};
pub use stream::{channel_callback, thought_to_event, ThoughtCallback};
pub use tools::{
    McpReloadTool, SkillReloadTool, Tool, ToolContext, ToolError, ToolRegistry, ToolResult,
    TOOL_MCP_RELOAD, TOOL_SKILL_RELOAD,
};
