//! Config consumption map and unused-key guard.
//!
//! "Consumed pointers" are JSON Pointer prefixes. A leaf under any consumed
//! prefix counts as read; any other leaf is reported as unused. Callers pick
//! whether unused keys warn or fail.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Command families, each reading a different slice of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// `data generate|refresh|preprocess|compare`
    Data,
    /// `runs log|compare`, `eval`
    Track,
    /// `promote`, `registry ...`
    Promote,
}

impl CommandMode {
    pub const ALL: [CommandMode; 3] = [CommandMode::Data, CommandMode::Track, CommandMode::Promote];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandMode::Data => "DATA",
            CommandMode::Track => "TRACK",
            CommandMode::Promote => "PROMOTE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Pointers each command family actually reads. Keep this in step with the
/// `PipelineConfig` sections the CLI touches per command.
pub fn consumed_pointers_for_mode(mode: CommandMode) -> &'static [&'static str] {
    match mode {
        CommandMode::Data => &["/data", "/refresh"],
        CommandMode::Track => &[
            "/model",
            "/store",
            "/models",
            "/split",
            "/promotion/metric",
        ],
        CommandMode::Promote => &["/model", "/store", "/exports", "/promotion"],
    }
}

/// Produce an unused-key report for `mode`.
///
/// With `UnusedKeyPolicy::Fail` an unclean report is an error; with `Warn`
/// the report is always returned.
pub fn report_unused_keys(
    mode: CommandMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    build_report(
        mode.as_str(),
        consumed_pointers_for_mode(mode).iter().copied(),
        config_json,
        policy,
    )
}

/// Leaves no command family reads at all: typos and stale keys.
pub fn report_unknown_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    build_report(
        "ANY",
        CommandMode::ALL
            .iter()
            .flat_map(|m| consumed_pointers_for_mode(*m).iter().copied()),
        config_json,
        policy,
    )
}

fn build_report<'a>(
    mode: &str,
    prefixes: impl Iterator<Item = &'a str>,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = prefixes.map(normalize_pointer).collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, leaf)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        mode: mode.to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {}",
            report.mode,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc". "/" consumes all.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{prefix}/{i}");
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    format!("{:?}", items.iter().take(n).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_respects_segment_boundaries() {
        assert!(is_prefix_pointer("/data", "/data/seed"));
        assert!(is_prefix_pointer("/data", "/data"));
        assert!(!is_prefix_pointer("/data", "/database/url"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let v = serde_json::json!({"a/b": {"c~d": 1}});
        let mut out = Vec::new();
        collect_leaf_pointers(&v, "", &mut out);
        assert_eq!(out, vec!["/a~1b/c~0d"]);
        assert_eq!(v.pointer(&out[0]), Some(&serde_json::json!(1)));
    }

    #[test]
    fn normalize_adds_leading_and_strips_trailing_slash() {
        assert_eq!(normalize_pointer("data/"), "/data");
        assert_eq!(normalize_pointer(""), "/");
    }
}
