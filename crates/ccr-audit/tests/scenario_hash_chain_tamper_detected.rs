//! Audit hash chain integrity.
//!
//! GREEN when:
//! - An untampered chain verifies with the right line count.
//! - Editing one payload breaks verification at that line.
//! - Dropping a line breaks verification.
//! - Resuming a log continues the chain so the whole file still verifies.
//! - Resuming a tampered log is refused.

use ccr_audit::{events, read_events, verify_hash_chain, AuditWriter, VerifyResult};
use serde_json::json;
use uuid::Uuid;

const MODEL: &str = "customer-churn-classifier";

fn write_events(path: &std::path::Path, n: usize) {
    let mut writer = AuditWriter::new(path, true, Uuid::new_v4()).unwrap();
    for i in 0..n {
        writer
            .append(
                MODEL,
                events::DECISION_COMPUTED,
                json!({"challenger_version": i + 2, "improvement": 0.008000000000000007}),
            )
            .unwrap();
    }
}

#[test]
fn untampered_chain_verifies_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_events(&path, 5);

    assert_eq!(verify_hash_chain(&path).unwrap(), VerifyResult::Valid { lines: 5 });

    let evs = read_events(&path).unwrap();
    assert_eq!(evs.len(), 5);
    assert_eq!(evs[0].hash_prev, None);
    assert_eq!(evs[1].hash_prev, evs[0].hash_self);
    assert!(evs.iter().enumerate().all(|(i, e)| e.seq == i as u64));
}

#[test]
fn tampered_payload_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_events(&path, 5);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    lines[2] = lines[2].replace("\"challenger_version\":4", "\"challenger_version\":99");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    match verify_hash_chain(&path).unwrap() {
        VerifyResult::Broken { line, reason } => {
            assert_eq!(line, 3);
            assert!(reason.contains("hash_self mismatch"), "{reason}");
        }
        other => panic!("expected Broken, got {other:?}"),
    }
}

#[test]
fn dropped_line_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_events(&path, 4);

    let content = std::fs::read_to_string(&path).unwrap();
    let kept: Vec<&str> = content
        .lines()
        .enumerate()
        .filter(|(i, _)| *i != 1)
        .map(|(_, l)| l)
        .collect();
    std::fs::write(&path, kept.join("\n") + "\n").unwrap();

    assert!(matches!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Broken { line: 2, .. }
    ));
}

#[test]
fn resume_continues_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_events(&path, 2);

    let mut writer = AuditWriter::resume(&path, true, Uuid::new_v4()).unwrap();
    assert_eq!(writer.seq(), 2);
    assert!(writer.last_hash().is_some());
    writer
        .append(MODEL, events::CHAMPION_PROMOTED, json!({"to": 3}))
        .unwrap();

    assert_eq!(verify_hash_chain(&path).unwrap(), VerifyResult::Valid { lines: 3 });
}

#[test]
fn resume_on_missing_file_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("audit.jsonl");
    let writer = AuditWriter::resume(&path, true, Uuid::new_v4()).unwrap();
    assert_eq!(writer.seq(), 0);
    assert_eq!(writer.last_hash(), None);
}

#[test]
fn resume_refuses_tampered_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_events(&path, 3);
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replacen("\"challenger_version\":2", "\"challenger_version\":7", 1))
        .unwrap();

    let err = AuditWriter::resume(&path, true, Uuid::new_v4()).err().unwrap();
    assert!(err.to_string().contains("AUDIT_CHAIN_BROKEN"));
}
