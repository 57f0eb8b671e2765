use chrono::Utc;
use tracing::{error, info, warn};

use ccr_registry::{MetricStore, ModelRegistry, ModelVersion};

use crate::config::PromotionConfig;
use crate::error::{PromotionError, PromotionResult};
use crate::evaluator::{decide, demotion_description, rejection_annotation, validate_score};
use crate::types::{
    Challenger, Champion, PromotionDecision, PromotionOutcome, RegistryOp, ScoreRole,
};

/// Champion/challenger gate over a model registry and a metric store.
///
/// The engine holds no state of its own between calls. `evaluate` only
/// reads; `apply` performs the registry mutations a decision implies.
pub struct PromotionEngine<'a, R: ?Sized, M: ?Sized> {
    registry: &'a R,
    metrics: &'a M,
    config: PromotionConfig,
}

impl<'a, R, M> PromotionEngine<'a, R, M>
where
    R: ModelRegistry + ?Sized,
    M: MetricStore + ?Sized,
{
    pub fn new(
        registry: &'a R,
        metrics: &'a M,
        config: PromotionConfig,
    ) -> PromotionResult<Self> {
        let problems = config.problems();
        if !problems.is_empty() {
            return Err(PromotionError::InvalidConfig(problems));
        }
        Ok(Self {
            registry,
            metrics,
            config,
        })
    }

    pub fn config(&self) -> &PromotionConfig {
        &self.config
    }

    /// Build a challenger from a registered version, reading its score from
    /// the version's run.
    pub fn load_challenger(&self, model: &str, version: u64) -> PromotionResult<Challenger> {
        let mv = self
            .registry
            .get_version(model, version)
            .map_err(|e| PromotionError::from_read(model, "get_version", e))?;
        let score = self.run_score(model, ScoreRole::Challenger, &mv)?;
        Ok(Challenger {
            version: mv.version,
            run_id: mv.run_id,
            score,
        })
    }

    /// The version holding the champion alias and its validated score.
    pub fn current_champion(&self, model: &str) -> PromotionResult<Champion> {
        let mv = self
            .registry
            .get_version_by_alias(model, &self.config.champion_alias)
            .map_err(|e| PromotionError::from_read(model, "get_version_by_alias", e))?;
        let score = self.run_score(model, ScoreRole::Champion, &mv)?;
        let score = validate_score(
            model,
            ScoreRole::Champion,
            mv.version,
            score,
            self.config.score_bounds,
        )?;
        Ok(Champion {
            version: mv.version,
            run_id: mv.run_id,
            score,
            description: mv.description,
        })
    }

    /// Compute the decision without touching the registry.
    ///
    /// Calling this twice against an unchanged registry yields the same
    /// decision.
    pub fn evaluate(
        &self,
        model: &str,
        challenger: &Challenger,
    ) -> PromotionResult<PromotionDecision> {
        validate_score(
            model,
            ScoreRole::Challenger,
            challenger.version,
            challenger.score,
            self.config.score_bounds,
        )?;

        let champion = self.current_champion(model)?;
        if champion.version == challenger.version {
            return Err(PromotionError::ChallengerIsChampion {
                model: model.to_string(),
                version: challenger.version,
            });
        }

        let registered = self
            .registry
            .get_version(model, challenger.version)
            .map_err(|e| PromotionError::from_read(model, "get_version", e))?;
        if registered.run_id != challenger.run_id {
            warn!(
                model,
                version = challenger.version,
                registered_run = %registered.run_id,
                supplied_run = %challenger.run_id,
                "challenger run id differs from the registered version"
            );
        }

        let decision = decide(&self.config, model, challenger, &champion);
        info!(
            model,
            challenger = decision.challenger_version,
            champion = decision.champion_version,
            challenger_score = decision.challenger_score,
            champion_score = decision.champion_score,
            improvement = decision.improvement,
            threshold = decision.threshold,
            promoted = decision.promoted,
            "promotion decision computed"
        );
        Ok(decision)
    }

    /// Perform the registry mutations for `decision`.
    ///
    /// Promotion moves the champion alias in one call, then records the
    /// demotion on the previous champion. Rejection tags the challenger.
    /// On failure the error carries the decision and the operations that
    /// already went through.
    pub fn apply(&self, decision: &PromotionDecision) -> PromotionResult<PromotionOutcome> {
        let model = decision.model_name.as_str();
        let alias = self.config.champion_alias.as_str();
        let mut applied: Vec<RegistryOp> = Vec::new();

        if decision.promoted {
            let holder = match self.registry.get_version_by_alias(model, alias) {
                Ok(mv) => Some(mv),
                Err(e) if e.is_not_found() => None,
                Err(e) => {
                    return Err(PromotionError::RegistryRead {
                        model: model.to_string(),
                        operation: "get_version_by_alias",
                        source: e,
                    })
                }
            };
            let previous = match holder {
                Some(mv) if mv.version == decision.champion_version => mv,
                other => {
                    return Err(PromotionError::StaleDecision {
                        model: model.to_string(),
                        expected_champion: decision.champion_version,
                        found_champion: other.map(|mv| mv.version),
                    })
                }
            };

            self.registry
                .reassign_alias(model, alias, decision.challenger_version)
                .map_err(|e| {
                    write_failure(
                        decision,
                        decision.challenger_version,
                        RegistryOp::ReassignAlias,
                        &applied,
                        e,
                    )
                })?;
            applied.push(RegistryOp::ReassignAlias);
            info!(
                model,
                alias,
                from = decision.champion_version,
                to = decision.challenger_version,
                "champion alias reassigned"
            );

            let text = demotion_description(
                decision,
                alias,
                previous.description.as_deref(),
                Utc::now(),
            );
            self.registry
                .update_version_description(model, decision.champion_version, &text)
                .map_err(|e| {
                    write_failure(
                        decision,
                        decision.champion_version,
                        RegistryOp::UpdateDescription,
                        &applied,
                        e,
                    )
                })?;
            applied.push(RegistryOp::UpdateDescription);
        } else {
            let annotation = rejection_annotation(decision).to_string();
            self.registry
                .set_version_tag(
                    model,
                    decision.challenger_version,
                    &self.config.rejection_tag_key,
                    &annotation,
                )
                .map_err(|e| {
                    write_failure(
                        decision,
                        decision.challenger_version,
                        RegistryOp::SetVersionTag,
                        &applied,
                        e,
                    )
                })?;
            applied.push(RegistryOp::SetVersionTag);
            info!(
                model,
                version = decision.challenger_version,
                key = %self.config.rejection_tag_key,
                "challenger rejected and tagged"
            );
        }

        Ok(PromotionOutcome {
            decision: decision.clone(),
            applied,
        })
    }

    /// Evaluate then apply.
    pub fn run(&self, model: &str, challenger: &Challenger) -> PromotionResult<PromotionOutcome> {
        let decision = self.evaluate(model, challenger)?;
        self.apply(&decision)
    }

    fn run_score(&self, model: &str, role: ScoreRole, mv: &ModelVersion) -> PromotionResult<f64> {
        let metrics = self
            .metrics
            .get_metrics(&mv.run_id)
            .map_err(|e| PromotionError::from_read(model, "get_metrics", e))?;
        metrics
            .get(&self.config.metric)
            .copied()
            .ok_or_else(|| PromotionError::InvalidScore {
                model: model.to_string(),
                role,
                version: mv.version,
                value: None,
                reason: format!(
                    "run '{}' has no '{}' metric",
                    mv.run_id, self.config.metric
                ),
            })
    }
}

fn write_failure(
    decision: &PromotionDecision,
    version: u64,
    operation: RegistryOp,
    completed: &[RegistryOp],
    source: ccr_registry::RegistryError,
) -> PromotionError {
    error!(
        model = %decision.model_name,
        version,
        op = %operation,
        error = %source,
        "registry write failed during promotion"
    );
    PromotionError::RegistryWrite {
        model: decision.model_name.clone(),
        version,
        operation,
        completed: completed.to_vec(),
        source,
        decision: Box::new(decision.clone()),
    }
}
