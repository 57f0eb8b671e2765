//! Champion/challenger promotion.
//!
//! A challenger replaces the champion when its score on the configured
//! metric beats the champion's by at least the threshold. Decisions are
//! pure (`evaluator`); the engine reads scores from a metric store and
//! applies the outcome to a model registry.

mod config;
mod engine;
mod error;
mod evaluator;
mod types;

pub use config::{
    PromotionConfig, ScoreBounds, DEFAULT_CHAMPION_ALIAS, DEFAULT_METRIC,
    DEFAULT_REJECTION_TAG_KEY, DEFAULT_THRESHOLD,
};
pub use engine::PromotionEngine;
pub use error::{PromotionError, PromotionResult};
pub use evaluator::{
    decide, demotion_description, meets_threshold, rejection_annotation, validate_score,
    BOUNDARY_EPSILON,
};
pub use types::{
    write_promotion_report_json, Challenger, Champion, PromotionDecision, PromotionOutcome,
    PromotionReport, RegistryOp, ScoreRole,
};
