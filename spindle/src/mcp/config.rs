//! MCP configuration: the `mcp.json` file and per-server connection config.
//!
//! File shape: `{"mcpServers": {"<name>": {"transport": "stdio"|"sse", ...}}}`.
//! The server name comes exclusively from the map key; there is no name
//! field inside the entry.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Transport used to reach a server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Sse,
}

/// One server entry. stdio servers use command/args/env; sse servers use
/// url. The loader fills `name` from the map key after parsing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub name: String,
    pub transport: Transport,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
struct McpFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: HashMap<String, ServerConfig>,
}

/// Reads and parses `mcp.json`. A missing file means no servers are
/// configured and is not an error; a malformed file is.
pub fn load_config(path: &Path) -> Result<HashMap<String, ServerConfig>, AgentError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let file: McpFile = serde_json::from_str(&raw)
        .map_err(|e| AgentError::Parse(format!("{}: {}", path.display(), e)))?;
    let mut servers = file.mcp_servers;
    for (key, cfg) in servers.iter_mut() {
        cfg.name = key.clone();
    }
    Ok(servers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_map_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(
            &path,
            r#"{"mcpServers": {
                "files": {"transport": "stdio", "command": "mcp-files", "args": ["--root", "."], "env": {"TOKEN": "x"}},
                "search": {"transport": "sse", "url": "http://127.0.0.1:9000/mcp"}
            }}"#,
        )
        .unwrap();
        let servers = load_config(&path).unwrap();
        assert_eq!(servers.len(), 2);
        let files = &servers["files"];
        assert_eq!(files.name, "files");
        assert_eq!(files.transport, Transport::Stdio);
        assert_eq!(files.command, "mcp-files");
        assert_eq!(files.env["TOKEN"], "x");
        let search = &servers["search"];
        assert_eq!(search.name, "search");
        assert_eq!(search.transport, Transport::Sse);
        assert_eq!(search.url, "http://127.0.0.1:9000/mcp");
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let servers = load_config(&dir.path().join("mcp.json")).unwrap();
        assert!(servers.is_empty());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn unknown_transport_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(
            &path,
            r#"{"mcpServers": {"x": {"transport": "carrier-pigeon"}}}"#,
        )
        .unwrap();
        assert!(load_config(&path).is_err());
    }
}
