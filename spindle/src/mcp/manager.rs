//! MCP manager: connection lifecycle for configured servers, adapter
//! registration, safety gating of script-backed stdio servers, and the
//! hot-reload diff over `mcp.json`.
//!
//! The manager lock is held only around the diff; scanning and connecting
//! run outside it so one slow server does not block the others.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::AgentError;
use crate::scanner::{has_critical, scan_file, Severity};
use crate::tools::ToolRegistry;

use super::adapter::register_server_tools;
use super::client::McpClient;
use super::config::{load_config, ServerConfig, Transport};

/// Extensions the safety gate recognises as script files.
const SCRIPT_EXTENSIONS: &[&str] = &[".py", ".ts", ".js"];

/// Human-readable diff of one reload.
#[derive(Debug, Default)]
pub struct McpReloadSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    /// Servers whose script failed the safety gate: `name (rule ids)`.
    pub blocked: Vec<String>,
    /// Non-blocking scanner findings.
    pub warnings: Vec<String>,
    /// Per-server connect/list failures.
    pub errors: Vec<String>,
}

impl std::fmt::Display for McpReloadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "mcp reload: +{} -{} ~{}",
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
        for blocked in &self.blocked {
            writeln!(f, "  BLOCKED: {}", blocked)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        for error in &self.errors {
            writeln!(f, "  error: {}", error)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct McpState {
    clients: HashMap<String, Arc<McpClient>>,
    configs: HashMap<String, ServerConfig>,
    /// Adapter names registered per server, for unregistration.
    adapters: HashMap<String, Vec<String>>,
}

/// Owns the client and config maps; registers adapters into the shared
/// registry.
pub struct McpManager {
    config_path: PathBuf,
    registry: Arc<ToolRegistry>,
    state: Mutex<McpState>,
}

impl McpManager {
    pub fn new(config_path: impl Into<PathBuf>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config_path: config_path.into(),
            registry,
            state: Mutex::new(McpState::default()),
        }
    }

    /// Names of currently connected servers.
    pub async fn client_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.clients.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn has_client(&self, name: &str) -> bool {
        self.state.lock().await.clients.contains_key(name)
    }

    /// Startup load; same semantics as `reload` against an empty state.
    pub async fn load_all(&self) -> Result<McpReloadSummary, AgentError> {
        self.reload().await
    }

    /// Re-reads `mcp.json` and applies the diff: removed servers are closed
    /// and their adapters unregistered, unchanged servers stay untouched,
    /// new or changed servers are gated, connected, and registered.
    pub async fn reload(&self) -> Result<McpReloadSummary, AgentError> {
        let new_configs = load_config(&self.config_path)?;
        let mut summary = McpReloadSummary::default();

        // Diff under the lock; teardown and connect happen outside it.
        let (to_close, to_setup, previously_known) = {
            let mut state = self.state.lock().await;
            let mut to_close: Vec<(String, Option<Arc<McpClient>>, Vec<String>)> = Vec::new();

            let removed: Vec<String> = state
                .configs
                .keys()
                .filter(|name| !new_configs.contains_key(*name))
                .cloned()
                .collect();
            for name in removed {
                state.configs.remove(&name);
                let client = state.clients.remove(&name);
                let adapters = state.adapters.remove(&name).unwrap_or_default();
                summary.removed.push(name.clone());
                to_close.push((name, client, adapters));
            }

            let mut to_setup = Vec::new();
            let mut previously_known = Vec::new();
            for (name, cfg) in &new_configs {
                let unchanged = state.configs.get(name) == Some(cfg);
                if unchanged {
                    continue; // leave state intact
                }
                if state.configs.remove(name).is_some() {
                    // changed: tear down the old connection first
                    let client = state.clients.remove(name);
                    let adapters = state.adapters.remove(name).unwrap_or_default();
                    to_close.push((name.clone(), client, adapters));
                    previously_known.push(name.clone());
                }
                to_setup.push(cfg.clone());
            }
            (to_close, to_setup, previously_known)
        };

        for (name, client, adapters) in to_close {
            for adapter in adapters {
                self.registry.unregister(&adapter);
            }
            if let Some(client) = client {
                client.close().await;
            }
            tracing::debug!(server = %name, "mcp server torn down");
        }

        for cfg in to_setup {
            if let Some(outcome) = self.safety_gate(&cfg, &mut summary) {
                if !outcome {
                    continue;
                }
            }
            match self.connect_and_register(&cfg).await {
                Ok((client, adapters)) => {
                    let mut state = self.state.lock().await;
                    state.clients.insert(cfg.name.clone(), client);
                    state.adapters.insert(cfg.name.clone(), adapters);
                    state.configs.insert(cfg.name.clone(), cfg.clone());
                    if previously_known.contains(&cfg.name) {
                        summary.updated.push(cfg.name.clone());
                    } else {
                        summary.added.push(cfg.name.clone());
                    }
                }
                Err(e) => summary.errors.push(format!("{}: {}", cfg.name, e)),
            }
        }

        summary.added.sort();
        summary.removed.sort();
        summary.updated.sort();
        tracing::info!(
            added = summary.added.len(),
            removed = summary.removed.len(),
            blocked = summary.blocked.len(),
            errors = summary.errors.len(),
            "mcp reload applied"
        );
        Ok(summary)
    }

    /// Runs the safety scanner over a script-backed stdio command.
    /// Returns `None` when no script is involved, `Some(true)` to proceed,
    /// `Some(false)` when activation is blocked or the scan failed.
    fn safety_gate(&self, cfg: &ServerConfig, summary: &mut McpReloadSummary) -> Option<bool> {
        let script = script_path(cfg)?;
        match scan_file(&script) {
            Ok(findings) => {
                for finding in findings.iter().filter(|f| f.severity == Severity::Warn) {
                    summary.warnings.push(format!(
                        "{}: {} at {}:{}",
                        cfg.name,
                        finding.rule,
                        finding.file.display(),
                        finding.line
                    ));
                }
                if has_critical(&findings) {
                    let mut rules: Vec<&str> = findings
                        .iter()
                        .filter(|f| f.severity == Severity::Critical)
                        .map(|f| f.rule)
                        .collect();
                    rules.sort();
                    rules.dedup();
                    summary
                        .blocked
                        .push(format!("{} ({})", cfg.name, rules.join(", ")));
                    tracing::warn!(server = %cfg.name, rules = rules.join(","), "mcp server blocked by safety gate");
                    Some(false)
                } else {
                    Some(true)
                }
            }
            Err(e) => {
                summary
                    .errors
                    .push(format!("{}: scan {}: {}", cfg.name, script.display(), e));
                Some(false)
            }
        }
    }

    async fn connect_and_register(
        &self,
        cfg: &ServerConfig,
    ) -> Result<(Arc<McpClient>, Vec<String>), crate::tools::ToolError> {
        let client = Arc::new(McpClient::connect(cfg).await?);
        match register_server_tools(&self.registry, &cfg.name, &client).await {
            Ok(adapters) => Ok((client, adapters)),
            Err(e) => {
                client.close().await;
                Err(e)
            }
        }
    }
}

/// The script file a stdio command points at, if any: the command itself
/// or the first argument ending in a script extension.
fn script_path(cfg: &ServerConfig) -> Option<PathBuf> {
    if cfg.transport != Transport::Stdio {
        return None;
    }
    std::iter::once(cfg.command.as_str())
        .chain(cfg.args.iter().map(String::as_str))
        .find(|candidate| {
            SCRIPT_EXTENSIONS
                .iter()
                .any(|ext| candidate.ends_with(ext))
        })
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdio_cfg(command: &str, args: &[&str]) -> ServerConfig {
        ServerConfig {
            name: "s".to_string(),
            transport: Transport::Stdio,
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            url: String::new(),
        }
    }

    #[test]
    fn script_path_checks_command_then_args() {
        assert_eq!(
            script_path(&stdio_cfg("server.py", &[])),
            Some(PathBuf::from("server.py"))
        );
        assert_eq!(
            script_path(&stdio_cfg("python3", &["-u", "server.py"])),
            Some(PathBuf::from("server.py"))
        );
        assert_eq!(
            script_path(&stdio_cfg("node", &["dist/server.js"])),
            Some(PathBuf::from("dist/server.js"))
        );
        assert!(script_path(&stdio_cfg("mcp-files", &["--root", "."])).is_none());
    }

    #[test]
    fn sse_servers_are_never_gated() {
        let cfg = ServerConfig {
            name: "s".to_string(),
            transport: Transport::Sse,
            command: String::new(),
            args: vec!["whatever.py".to_string()],
            env: HashMap::new(),
            url: "http://example".to_string(),
        };
        assert!(script_path(&cfg).is_none());
    }
}
