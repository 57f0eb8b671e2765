//! Missing model, missing champion and missing challenger version.
//!
//! GREEN when:
//! - Each case fails with NotFound and nothing is written.
//! - A challenger that already holds the alias fails with ChallengerIsChampion.

use ccr_promotion::{Challenger, PromotionConfig, PromotionEngine, PromotionError};
use ccr_registry::MemoryStore;
use ccr_testkit::{alias_holders, seed_champion, seed_version, FaultyRegistry, CHAMPION, MODEL};

fn challenger(version: u64) -> Challenger {
    Challenger {
        version,
        run_id: "unused".into(),
        score: 0.8,
    }
}

#[test]
fn unknown_model_is_not_found() {
    let store = MemoryStore::new();
    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let err = engine.run("no-such-model", &challenger(1)).unwrap_err();
    assert!(matches!(err, PromotionError::NotFound { ref model, .. } if model == "no-such-model"));
}

#[test]
fn model_without_champion_is_not_found() {
    let reg = FaultyRegistry::new(MemoryStore::new());
    let v = seed_version(&reg, MODEL, "rf", 0.76).unwrap();

    let engine = PromotionEngine::new(&reg, &reg, PromotionConfig::default()).unwrap();
    let err = engine.run(MODEL, &challenger(v.version)).unwrap_err();

    assert!(matches!(err, PromotionError::NotFound { .. }), "{err}");
    assert!(err.to_string().contains("@champion"));
    assert!(reg.writes().is_empty());
    assert!(alias_holders(&reg, MODEL, CHAMPION).unwrap().is_empty());
}

#[test]
fn unregistered_challenger_version_is_not_found() {
    let store = MemoryStore::new();
    seed_champion(&store, MODEL, 0.76).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let err = engine.run(MODEL, &challenger(99)).unwrap_err();
    assert!(matches!(err, PromotionError::NotFound { .. }), "{err}");
    assert!(engine.load_challenger(MODEL, 99).is_err());
}

#[test]
fn current_champion_cannot_challenge_itself() {
    let store = MemoryStore::new();
    let champ = seed_champion(&store, MODEL, 0.76).unwrap();

    let engine = PromotionEngine::new(&store, &store, PromotionConfig::default()).unwrap();
    let c = engine.load_challenger(MODEL, champ.version).unwrap();
    let err = engine.run(MODEL, &c).unwrap_err();

    assert_eq!(
        err,
        PromotionError::ChallengerIsChampion {
            model: MODEL.to_string(),
            version: champ.version,
        }
    );
}
