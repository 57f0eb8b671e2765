//! Challenger clears the threshold.
//!
//! GREEN when:
//! - The champion alias moves to the challenger in a single reassignment.
//! - Exactly one version holds the alias afterwards.
//! - The demoted champion's description records the demotion and keeps its
//!   previous text.
//! - An improvement exactly equal to the threshold promotes.

use ccr_promotion::{Challenger, PromotionConfig, PromotionEngine, RegistryOp};
use ccr_registry::{MemoryStore, ModelRegistry};
use ccr_testkit::{alias_holders, seed_champion, seed_version, CHAMPION, MODEL};

fn challenger_of(seeded: &ccr_testkit::Seeded) -> Challenger {
    Challenger {
        version: seeded.version,
        run_id: seeded.run_id.clone(),
        score: seeded.roc_auc,
    }
}

#[test]
fn clear_improvement_moves_the_alias() {
    let store = MemoryStore::new();
    let champ = seed_champion(&store, MODEL, 0.760).unwrap();
    store
        .update_version_description(MODEL, champ.version, "Random Forest baseline")
        .unwrap();
    let chal = seed_version(&store, MODEL, "gradient_boosting", 0.768).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let outcome = engine.run(MODEL, &challenger_of(&chal)).unwrap();

    assert!(outcome.decision.promoted);
    assert_eq!(outcome.decision.champion_version, champ.version);
    assert_eq!(outcome.decision.challenger_version, chal.version);
    assert!((outcome.decision.improvement - 0.008).abs() < 1e-12);
    assert_eq!(
        outcome.applied,
        vec![RegistryOp::ReassignAlias, RegistryOp::UpdateDescription]
    );

    let now = store.get_version_by_alias(MODEL, CHAMPION).unwrap();
    assert_eq!(now.version, chal.version);
    assert_eq!(alias_holders(&store, MODEL, CHAMPION).unwrap(), vec![chal.version]);

    let demoted = store.get_version(MODEL, champ.version).unwrap();
    let text = demoted.description.unwrap();
    assert!(text.starts_with("Demoted from @champion"), "{text}");
    assert!(text.contains(&format!("replaced by v{}", chal.version)));
    assert!(text.ends_with("Previous description: Random Forest baseline"));
}

#[test]
fn improvement_equal_to_threshold_promotes() {
    let store = MemoryStore::new();
    seed_champion(&store, MODEL, 0.760).unwrap();
    let chal = seed_version(&store, MODEL, "gradient_boosting", 0.765).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let outcome = engine.run(MODEL, &challenger_of(&chal)).unwrap();

    assert!(outcome.decision.promoted, "{}", outcome.decision.reason);
    assert_eq!(
        store.get_version_by_alias(MODEL, CHAMPION).unwrap().version,
        chal.version
    );
}

#[test]
fn promoted_challenger_carries_no_rejection_tag() {
    let store = MemoryStore::new();
    seed_champion(&store, MODEL, 0.700).unwrap();
    let chal = seed_version(&store, MODEL, "gradient_boosting", 0.800).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    engine.run(MODEL, &challenger_of(&chal)).unwrap();

    let v = store.get_version(MODEL, chal.version).unwrap();
    assert!(!v.tags.contains_key("promotion_decision"));
}

#[test]
fn custom_alias_and_metric_are_honoured() {
    let store = MemoryStore::new();
    let (v1, _) = ccr_testkit::seed_version_with(
        &store,
        MODEL,
        "rf",
        &[("f1".to_string(), 0.60)].into_iter().collect(),
    )
    .unwrap();
    store.reassign_alias(MODEL, "production", v1).unwrap();
    let (v2, run2) = ccr_testkit::seed_version_with(
        &store,
        MODEL,
        "gb",
        &[("f1".to_string(), 0.70)].into_iter().collect(),
    )
    .unwrap();

    let config = PromotionConfig {
        metric: "f1".into(),
        champion_alias: "production".into(),
        threshold: 0.05,
        ..PromotionConfig::default()
    };
    let engine = PromotionEngine::new(&store, &store, config).unwrap();
    let challenger = engine.load_challenger(MODEL, v2).unwrap();
    assert_eq!(challenger.run_id, run2);

    let outcome = engine.run(MODEL, &challenger).unwrap();
    assert!(outcome.decision.promoted);
    assert_eq!(alias_holders(&store, MODEL, "production").unwrap(), vec![v2]);
}
