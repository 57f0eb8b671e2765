//! Evaluation is inspection only.
//!
//! GREEN when:
//! - Two evaluations against an unchanged registry return identical decisions.
//! - Evaluation attempts no registry write.
//! - Applying a decision after the champion alias moved is refused.
//! - The report artifact round-trips through JSON.

use chrono::Utc;

use ccr_promotion::{
    write_promotion_report_json, PromotionConfig, PromotionEngine, PromotionError,
    PromotionReport,
};
use ccr_registry::{MemoryStore, ModelRegistry};
use ccr_testkit::{seed_champion, seed_version, FaultyRegistry, CHAMPION, MODEL};

#[test]
fn evaluate_twice_gives_same_decision_and_writes_nothing() {
    let reg = FaultyRegistry::new(MemoryStore::new());
    seed_champion(&reg, MODEL, 0.760).unwrap();
    let chal = seed_version(&reg, MODEL, "gb", 0.768).unwrap();
    let before = reg.inner().snapshot().unwrap();
    let writes_before = reg.writes().len();

    let engine = PromotionEngine::new(&reg, &reg, PromotionConfig::default()).unwrap();
    let c = engine.load_challenger(MODEL, chal.version).unwrap();
    let first = engine.evaluate(MODEL, &c).unwrap();
    let second = engine.evaluate(MODEL, &c).unwrap();

    assert_eq!(first, second);
    assert_eq!(reg.writes().len(), writes_before);
    assert_eq!(reg.inner().snapshot().unwrap(), before);
}

#[test]
fn stale_decision_is_not_applied() {
    let store = MemoryStore::new();
    seed_champion(&store, MODEL, 0.760).unwrap();
    let chal = seed_version(&store, MODEL, "gb", 0.768).unwrap();
    let other = seed_version(&store, MODEL, "rf-v2", 0.770).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let c = engine.load_challenger(MODEL, chal.version).unwrap();
    let decision = engine.evaluate(MODEL, &c).unwrap();

    store.reassign_alias(MODEL, CHAMPION, other.version).unwrap();
    let err = engine.apply(&decision).unwrap_err();

    assert!(matches!(
        err,
        PromotionError::StaleDecision {
            found_champion: Some(v),
            ..
        } if v == other.version
    ));
    assert_eq!(
        store.get_version_by_alias(MODEL, CHAMPION).unwrap().version,
        other.version
    );
}

#[test]
fn report_is_written_as_json() {
    let store = MemoryStore::new();
    seed_champion(&store, MODEL, 0.760).unwrap();
    let chal = seed_version(&store, MODEL, "gb", 0.768).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let c = engine.load_challenger(MODEL, chal.version).unwrap();
    let decision = engine.evaluate(MODEL, &c).unwrap();

    let report = PromotionReport {
        generated_at_utc: Utc::now(),
        config: engine.config().clone(),
        decision,
        apply_requested: false,
        applied: Vec::new(),
        apply_error: None,
    };
    let dir = tempfile::tempdir().unwrap();
    let path = write_promotion_report_json(dir.path(), &report).unwrap();
    assert!(path.ends_with(format!("promotion_v{}.json", chal.version)));

    let back: PromotionReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(back.decision.promoted);
    assert_eq!(back.decision.challenger_version, chal.version);
    assert_eq!(back.decision.champion_score, 0.760);
    assert_eq!(back.config, report.config);
    assert!(back.apply_error.is_none());
}
