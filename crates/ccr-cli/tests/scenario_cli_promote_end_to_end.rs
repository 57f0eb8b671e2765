//! Scenario: the champion/challenger gate driven through the `ccr` binary
//! against a file-backed registry.
//!
//! GREEN when:
//! - a challenger beating the champion by >= threshold takes `@champion`,
//!   and the old champion's description records the demotion
//! - a challenger below the threshold leaves the alias and is tagged
//! - `--dry-run` computes and reports without touching the registry
//! - every decision lands in a valid hash-chained audit log and a report file
//! - a model with no champion fails with PROMOTION_NOT_FOUND

use std::path::Path;

use assert_cmd::Command;
use ccr_registry::{FileStore, ModelRegistry};
use predicates::prelude::*;

const MODEL: &str = "customer-churn-classifier";

#[allow(deprecated)]
fn ccr(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ccr").unwrap();
    cmd.current_dir(dir)
        .env_remove("CCR_STORE_ROOT")
        .env("RUST_LOG", "warn")
        .arg("--store")
        .arg(dir.join("store"));
    cmd
}

fn log_version(dir: &Path, name: &str, roc_auc: f64) {
    let metrics = dir.join(format!("{name}.json"));
    std::fs::write(
        &metrics,
        format!(r#"{{"roc_auc": {roc_auc}, "accuracy": 0.70, "recall": 0.65}}"#),
    )
    .unwrap();
    ccr(dir)
        .args(["runs", "log", "--family", "random-forest", "--name", name, "--register"])
        .arg("--metrics")
        .arg(&metrics)
        .assert()
        .success()
        .stdout(predicate::str::contains("registered=true"));
}

fn champion_version(dir: &Path) -> u64 {
    let store = FileStore::open(dir.join("store")).unwrap();
    store.get_version_by_alias(MODEL, "champion").unwrap().version
}

#[test]
fn promote_then_reject_through_cli() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    log_version(dir, "rf_baseline", 0.760);
    ccr(dir)
        .args(["registry", "set-alias", "--version", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias_set=true"));
    assert_eq!(champion_version(dir), 1);

    // 0.768 - 0.760 = 0.008 >= 0.005
    log_version(dir, "rf_tuned", 0.768);
    ccr(dir)
        .args(["promote", "--version", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("promoted=true"))
        .stdout(predicate::str::contains(
            "applied=reassign_alias,update_version_description",
        ));
    assert_eq!(champion_version(dir), 2);

    let store = FileStore::open(dir.join("store")).unwrap();
    let v1 = store.get_version(MODEL, 1).unwrap();
    assert!(v1.aliases.is_empty());
    assert!(v1
        .description
        .as_deref()
        .unwrap()
        .starts_with("Demoted from @champion"));

    let report = dir.join("exports/promotions").join(MODEL).join("promotion_v2.json");
    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(v["decision"]["promoted"], true);
    assert_eq!(v["apply_requested"], true);

    // 0.770 - 0.768 = 0.002 < 0.005
    log_version(dir, "rf_marginal", 0.770);
    ccr(dir)
        .args(["promote", "--version", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("promoted=false"))
        .stdout(predicate::str::contains("applied=set_version_tag"));
    assert_eq!(champion_version(dir), 2);

    let v3 = store.get_version(MODEL, 3).unwrap();
    let tag: serde_json::Value =
        serde_json::from_str(v3.tags.get("promotion_decision").unwrap()).unwrap();
    assert_eq!(tag["decision"], "rejected");
    assert_eq!(tag["champion_version"], 2);

    ccr(dir)
        .args(["audit", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("audit_chain_valid=true"));

    let events = ccr_audit::read_events(dir.join("exports/audit/audit.jsonl")).unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "VERSION_REGISTERED",
            "ALIAS_SET",
            "VERSION_REGISTERED",
            "DECISION_COMPUTED",
            "CHAMPION_PROMOTED",
            "VERSION_REGISTERED",
            "DECISION_COMPUTED",
            "CHALLENGER_REJECTED",
        ]
    );
}

#[test]
fn dry_run_leaves_registry_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    log_version(dir, "rf_baseline", 0.760);
    ccr(dir)
        .args(["registry", "set-alias", "--version", "1"])
        .assert()
        .success();
    log_version(dir, "rf_tuned", 0.790);

    let before = std::fs::read_to_string(dir.join("store/registry.json")).unwrap();
    ccr(dir)
        .args(["promote", "--version", "2", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("promoted=true"))
        .stdout(predicate::str::contains("dry_run=true"))
        .stdout(predicate::str::contains("applied=\n"));
    let after = std::fs::read_to_string(dir.join("store/registry.json")).unwrap();
    assert_eq!(before, after);
    assert_eq!(champion_version(dir), 1);
}

#[test]
fn threshold_flag_overrides_config() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    log_version(dir, "rf_baseline", 0.760);
    ccr(dir)
        .args(["registry", "set-alias", "--version", "1"])
        .assert()
        .success();
    log_version(dir, "rf_tuned", 0.768);

    ccr(dir)
        .args(["promote", "--version", "2", "--threshold", "0.01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("promoted=false"))
        .stdout(predicate::str::contains("threshold=0.010000"));
    assert_eq!(champion_version(dir), 1);
}

#[test]
fn missing_champion_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    log_version(dir, "rf_baseline", 0.760);
    ccr(dir)
        .args(["promote", "--version", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROMOTION_NOT_FOUND"));
}
