use std::fmt;

use ccr_registry::RegistryError;

use crate::types::{PromotionDecision, RegistryOp, ScoreRole};

/// Everything that can stop a promotion.
///
/// Every variant names the model and, where one is involved, the version and
/// the registry operation, so a failure can be retried by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionError {
    /// Model unknown, no champion alias holder, or challenger version missing.
    NotFound { model: String, detail: String },
    /// A score is NaN/infinite, outside the configured bounds, or missing.
    InvalidScore {
        model: String,
        role: ScoreRole,
        version: u64,
        value: Option<f64>,
        reason: String,
    },
    /// The challenger already holds the champion alias.
    ChallengerIsChampion { model: String, version: u64 },
    /// The champion alias moved between evaluation and application.
    StaleDecision {
        model: String,
        expected_champion: u64,
        found_champion: Option<u64>,
    },
    /// A registry read failed for a reason other than "not found".
    RegistryRead {
        model: String,
        operation: &'static str,
        source: RegistryError,
    },
    /// A registry mutation failed. The decision was computed; `completed`
    /// lists the mutations that did go through before the failure.
    RegistryWrite {
        model: String,
        version: u64,
        operation: RegistryOp,
        completed: Vec<RegistryOp>,
        source: RegistryError,
        decision: Box<PromotionDecision>,
    },
    /// The promotion policy itself is unusable.
    InvalidConfig(Vec<String>),
}

impl PromotionError {
    /// The computed decision, when the failure happened after deciding.
    pub fn decision(&self) -> Option<&PromotionDecision> {
        match self {
            PromotionError::RegistryWrite { decision, .. } => Some(decision),
            _ => None,
        }
    }

    /// Map a registry read failure into the promotion taxonomy.
    pub(crate) fn from_read(model: &str, operation: &'static str, e: RegistryError) -> Self {
        if e.is_not_found() {
            PromotionError::NotFound {
                model: model.to_string(),
                detail: e.to_string(),
            }
        } else {
            PromotionError::RegistryRead {
                model: model.to_string(),
                operation,
                source: e,
            }
        }
    }
}

impl fmt::Display for PromotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionError::NotFound { model, detail } => {
                write!(f, "PROMOTION_NOT_FOUND model={model}: {detail}")
            }
            PromotionError::InvalidScore {
                model,
                role,
                version,
                value,
                reason,
            } => match value {
                Some(v) => write!(
                    f,
                    "PROMOTION_INVALID_SCORE model={model} {role}=v{version} value={v}: {reason}"
                ),
                None => write!(
                    f,
                    "PROMOTION_INVALID_SCORE model={model} {role}=v{version}: {reason}"
                ),
            },
            PromotionError::ChallengerIsChampion { model, version } => write!(
                f,
                "PROMOTION_CHALLENGER_IS_CHAMPION model={model} version={version}"
            ),
            PromotionError::StaleDecision {
                model,
                expected_champion,
                found_champion,
            } => match found_champion {
                Some(found) => write!(
                    f,
                    "PROMOTION_STALE_DECISION model={model}: decided against v{expected_champion}, champion is now v{found}"
                ),
                None => write!(
                    f,
                    "PROMOTION_STALE_DECISION model={model}: decided against v{expected_champion}, champion alias is gone"
                ),
            },
            PromotionError::RegistryRead {
                model,
                operation,
                source,
            } => write!(
                f,
                "PROMOTION_REGISTRY_READ model={model} op={operation}: {source}"
            ),
            PromotionError::RegistryWrite {
                model,
                version,
                operation,
                completed,
                source,
                ..
            } => {
                let done: Vec<&str> = completed.iter().map(|op| op.as_str()).collect();
                write!(
                    f,
                    "PROMOTION_REGISTRY_WRITE model={model} version={version} op={operation} completed=[{}]: {source}",
                    done.join(",")
                )
            }
            PromotionError::InvalidConfig(problems) => {
                write!(f, "PROMOTION_INVALID_CONFIG: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for PromotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromotionError::RegistryRead { source, .. }
            | PromotionError::RegistryWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type PromotionResult<T> = Result<T, PromotionError>;
