//! Scenario: experiment runs are ranked by a primary metric with a stable
//! tie-break chain.
//!
//! GREEN when:
//! - the highest primary metric ranks first
//! - equal primary metrics fall through recall, f1, accuracy, then name
//! - runs missing the metric, or holding NaN, are skipped and reported

use std::collections::BTreeMap;

use ccr_eval::rank_runs;
use ccr_registry::RunRecord;
use chrono::{TimeZone, Utc};

fn run(id: &str, name: &str, metrics: &[(&str, f64)]) -> RunRecord {
    RunRecord {
        run_id: id.to_string(),
        experiment: "churn-model-experiment".to_string(),
        run_name: name.to_string(),
        params: BTreeMap::new(),
        metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        tags: BTreeMap::new(),
        started_at_utc: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
    }
}

fn names(r: &ccr_eval::RunRanking) -> Vec<&str> {
    r.ranked.iter().map(|x| x.run_name.as_str()).collect()
}

#[test]
fn highest_primary_metric_wins() {
    let runs = vec![
        run("a", "rf_50_leaves_3_depth", &[("roc_auc", 0.71), ("recall", 0.9)]),
        run("b", "rf_100_leaves_5_depth", &[("roc_auc", 0.74), ("recall", 0.5)]),
        run("c", "rf_200_leaves_10_depth", &[("roc_auc", 0.73), ("recall", 0.6)]),
    ];
    let r = rank_runs(&runs, "roc_auc");
    assert_eq!(
        names(&r),
        vec!["rf_100_leaves_5_depth", "rf_200_leaves_10_depth", "rf_50_leaves_3_depth"]
    );
    assert_eq!(r.best().unwrap().rank, 1);
    assert_eq!(r.best().unwrap().score, 0.74);
    assert!(r.skipped.is_empty());
}

#[test]
fn ties_fall_through_recall_f1_accuracy_then_name() {
    let runs = vec![
        run("1", "zeta", &[("roc_auc", 0.75), ("recall", 0.6), ("f1", 0.5), ("accuracy", 0.7)]),
        run("2", "alpha", &[("roc_auc", 0.75), ("recall", 0.6), ("f1", 0.5), ("accuracy", 0.7)]),
        run("3", "mid_f1", &[("roc_auc", 0.75), ("recall", 0.6), ("f1", 0.55), ("accuracy", 0.6)]),
        run("4", "top_recall", &[("roc_auc", 0.75), ("recall", 0.7), ("f1", 0.1), ("accuracy", 0.1)]),
        run("5", "no_recall", &[("roc_auc", 0.75)]),
    ];
    let r = rank_runs(&runs, "roc_auc");
    assert_eq!(
        names(&r),
        vec!["top_recall", "mid_f1", "alpha", "zeta", "no_recall"]
    );
    assert_eq!(r.ranked.iter().map(|x| x.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn missing_and_nan_metrics_are_skipped() {
    let runs = vec![
        run("a", "ok", &[("roc_auc", 0.70)]),
        run("b", "nan", &[("roc_auc", f64::NAN)]),
        run("c", "absent", &[("accuracy", 0.9)]),
    ];
    let r = rank_runs(&runs, "roc_auc");
    assert_eq!(names(&r), vec!["ok"]);
    let skipped: Vec<&str> = r.skipped.iter().map(|s| s.run_name.as_str()).collect();
    assert_eq!(skipped, vec!["nan", "absent"]);
    assert!(r.skipped[1].reason.contains("not logged"));
}

#[test]
fn ranking_by_recall_does_not_reuse_it_as_tie_break() {
    let runs = vec![
        run("a", "b_run", &[("recall", 0.8), ("f1", 0.4)]),
        run("b", "a_run", &[("recall", 0.8), ("f1", 0.6)]),
    ];
    let r = rank_runs(&runs, "recall");
    assert_eq!(names(&r), vec!["a_run", "b_run"]);
}
