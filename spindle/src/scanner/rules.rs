//! Rule tables for the safety scanner.
//!
//! Two kinds of rule: line rules (trigger regex on one comment-stripped
//! line) and combination rules (trigger line + companion pattern anywhere
//! in the same file). Both language sets carry the same rule ids with the
//! same semantics, syntactically adapted.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Severity;

pub(crate) struct LineRule {
    pub id: &'static str,
    pub severity: Severity,
    pub trigger: Regex,
}

pub(crate) struct ComboRule {
    pub id: &'static str,
    pub severity: Severity,
    pub trigger: Regex,
    pub companion: Regex,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("scanner rule regex must compile")
}

/// Outbound network call, Python flavour.
const PY_NET: &str = r"\b(?:requests|httpx)\s*\.\s*\w+\s*\(";
/// Dynamic-execution sink, Python flavour.
const PY_SINK: &str = r"\b(?:eval|exec)\s*\(";
/// Outbound network call, JS flavour.
const JS_NET: &str = r"\bfetch\s*\(|\bhttps?\.request\s*\(";
/// Dynamic-execution sink, JS flavour.
const JS_SINK: &str = r"\beval\s*\(|new\s+Function\s*\(";

static PY_LINE_RULES: Lazy<Vec<LineRule>> = Lazy::new(|| {
    vec![
        LineRule {
            id: "dangerous-exec",
            severity: Severity::Critical,
            trigger: re(r"\bsubprocess\s*\.\s*\w+|\bos\.system\s*\(|\bos\.popen\s*\("),
        },
        LineRule {
            id: "dynamic-code",
            severity: Severity::Critical,
            trigger: re(PY_SINK),
        },
    ]
});

static PY_COMBO_RULES: Lazy<Vec<ComboRule>> = Lazy::new(|| {
    vec![
        ComboRule {
            id: "env-harvesting",
            severity: Severity::Critical,
            trigger: re(r"\bos\.environ\b"),
            companion: re(PY_NET),
        },
        ComboRule {
            id: "potential-exfil",
            severity: Severity::Warn,
            trigger: re(r"\bopen\s*\("),
            companion: re(PY_NET),
        },
        ComboRule {
            id: "obfuscated-code",
            severity: Severity::Warn,
            trigger: re(r"\bbase64\.b(?:16|32|64)decode\s*\(|\bbytes\.fromhex\s*\(|\bbinascii\.unhexlify\s*\("),
            companion: re(PY_SINK),
        },
    ]
});

static JS_LINE_RULES: Lazy<Vec<LineRule>> = Lazy::new(|| {
    vec![
        LineRule {
            id: "dangerous-exec",
            severity: Severity::Critical,
            trigger: re(r"\bchild_process\b|\bexecSync\s*\(|\bspawnSync\s*\("),
        },
        LineRule {
            id: "dynamic-code",
            severity: Severity::Critical,
            trigger: re(JS_SINK),
        },
    ]
});

static JS_COMBO_RULES: Lazy<Vec<ComboRule>> = Lazy::new(|| {
    vec![
        ComboRule {
            id: "env-harvesting",
            severity: Severity::Critical,
            trigger: re(r"\bprocess\.env\b"),
            companion: re(JS_NET),
        },
        ComboRule {
            id: "potential-exfil",
            severity: Severity::Warn,
            trigger: re(r"\bfs\.(?:readFile|readFileSync|createReadStream|open|openSync)\s*\("),
            companion: re(JS_NET),
        },
        ComboRule {
            id: "obfuscated-code",
            severity: Severity::Warn,
            trigger: re(r#"Buffer\.from\s*\([^)]*,\s*['"](?:base64|hex)['"]\s*\)|\batob\s*\("#),
            companion: re(JS_SINK),
        },
    ]
});

/// Rule sets for a file extension; `None` means the file is not scanned.
pub(crate) fn rule_sets(
    ext: &str,
) -> Option<(&'static [LineRule], &'static [ComboRule])> {
    match ext {
        "py" => Some((PY_LINE_RULES.as_slice(), PY_COMBO_RULES.as_slice())),
        "ts" | "js" | "mjs" | "cjs" => Some((JS_LINE_RULES.as_slice(), JS_COMBO_RULES.as_slice())),
        _ => None,
    }
}

/// Single-line comment marker for the language of the extension.
pub(crate) fn comment_marker(ext: &str) -> &'static str {
    if ext == "py" {
        "#"
    } else {
        "//"
    }
}
