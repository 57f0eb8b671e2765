//! Append-only JSONL audit log with an optional SHA-256 hash chain.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod events;

/// Namespace for deterministic event ids.
const EVENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c0e_2d1f_58a4_4c3b_9a7e_1f2b_3c4d_5e6f);

/// Append-only audit writer. One JSON event per line.
///
/// With the hash chain on, each event carries `hash_prev` (the previous
/// event's `hash_self`) and `hash_self` (hash of its own canonical form).
pub struct AuditWriter {
    path: PathBuf,
    hash_chain: bool,
    session_id: Uuid,
    last_hash: Option<String>,
    /// Number of events in the log; the next event's `seq`.
    seq: u64,
}

impl AuditWriter {
    /// Start a writer on `path`, creating parent dirs. Appends after any
    /// existing content without reading it; use [`AuditWriter::resume`] to
    /// continue an existing chain.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool, session_id: Uuid) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }

        Ok(Self {
            path,
            hash_chain,
            session_id,
            last_hash: None,
            seq: 0,
        })
    }

    /// Continue an existing log: verifies it, then restores the last hash and
    /// sequence counter. A missing file starts a fresh log.
    pub fn resume(path: impl AsRef<Path>, hash_chain: bool, session_id: Uuid) -> Result<Self> {
        let mut writer = Self::new(path, hash_chain, session_id)?;
        if !writer.path.exists() {
            return Ok(writer);
        }

        let content = fs::read_to_string(&writer.path)
            .with_context(|| format!("read audit log {:?}", writer.path))?;
        match verify_hash_chain_str(&content)? {
            VerifyResult::Valid { lines } => {
                let last = content
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(serde_json::from_str::<AuditEvent>)
                    .transpose()
                    .context("parse last audit event")?;
                writer.last_hash = last.and_then(|ev| ev.hash_self);
                writer.seq = lines as u64;
                Ok(writer)
            }
            VerifyResult::Broken { line, reason } => {
                bail!("AUDIT_CHAIN_BROKEN {:?} line={line}: {reason}", writer.path)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event about `subject` (a model name, a dataset path).
    pub fn append(&mut self, subject: &str, event_type: &str, payload: Value) -> Result<AuditEvent> {
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq)?;

        let mut ev = AuditEvent {
            event_id,
            session_id: self.session_id,
            seq: self.seq,
            ts_utc: Utc::now(),
            subject: subject.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            ev.hash_prev = self.last_hash.clone();
            let self_hash = compute_event_hash(&ev)?;
            ev.hash_self = Some(self_hash);
        }

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;

        // Only advance once the line is on disk.
        self.seq += 1;
        if self.hash_chain {
            self.last_hash = ev.hash_self.clone();
        }
        Ok(ev)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    /// One CLI invocation.
    pub session_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub subject: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Event id as a UUID v5 over the chain state, canonical payload and
/// sequence number. No randomness: the same log rebuilds the same ids.
pub fn derive_event_id(last_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let payload = canonical_json_line(payload)?;
    let name = format!("{}|{}|{}", last_hash.unwrap_or("GENESIS"), payload, seq);
    Ok(Uuid::new_v5(&EVENT_ID_NAMESPACE, name.as_bytes()))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {:?}", path))?;
    f.write_all(format!("{line}\n").as_bytes())
        .context("write audit line failed")?;
    Ok(())
}

/// Sorted keys, compact JSON.
fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit event failed")?;
    serde_json::to_string(&sort_keys(&raw)).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Hash of the event's canonical JSON with `hash_self` cleared.
pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;

    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Verify JSONL audit content.
///
/// Checks, per event: `seq` counts up from zero, `hash_prev` links to the
/// previous `hash_self`, `hash_self` matches the content, and `event_id`
/// matches its derivation. Blank lines are skipped.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_no = i + 1;

        let ev: AuditEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse audit event at line {line_no}"))?;

        if ev.seq != count as u64 {
            return Ok(VerifyResult::Broken {
                line: line_no,
                reason: format!("seq mismatch: expected {count}, got {}", ev.seq),
            });
        }

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: line_no,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, ev.hash_prev
                ),
            });
        }

        if let Some(claimed) = &ev.hash_self {
            let recomputed = compute_event_hash(&ev)?;
            if *claimed != recomputed {
                return Ok(VerifyResult::Broken {
                    line: line_no,
                    reason: format!("hash_self mismatch: claimed {claimed}, recomputed {recomputed}"),
                });
            }
        }

        let expected_id = derive_event_id(ev.hash_prev.as_deref(), &ev.payload, ev.seq)?;
        if ev.event_id != expected_id {
            return Ok(VerifyResult::Broken {
                line: line_no,
                reason: format!("event_id mismatch: expected {expected_id}, got {}", ev.event_id),
            });
        }

        count += 1;
        prev_hash = ev.hash_self;
    }

    Ok(VerifyResult::Valid { lines: count })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

/// Parse every event of a log, in order.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l.trim()).with_context(|| format!("parse audit event at line {}", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_id_is_deterministic_and_sensitive_to_inputs() {
        let p = json!({"b": 1, "a": 2});
        let reordered = json!({"a": 2, "b": 1});
        let a = derive_event_id(None, &p, 0).unwrap();
        assert_eq!(a, derive_event_id(None, &reordered, 0).unwrap());
        assert_ne!(a, derive_event_id(None, &p, 1).unwrap());
        assert_ne!(a, derive_event_id(Some("abc"), &p, 0).unwrap());
        assert_eq!(a.get_version_num(), 5);
    }

    #[test]
    fn sort_keys_is_recursive() {
        let v = json!({"z": {"b": 1, "a": [{"d": 1, "c": 2}]}, "y": 0});
        assert_eq!(
            canonical_json_line(&v).unwrap(),
            r#"{"y":0,"z":{"a":[{"c":2,"d":1}],"b":1}}"#
        );
    }
}
