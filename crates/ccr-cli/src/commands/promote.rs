//! `ccr promote`: evaluate a challenger against the champion and apply the
//! outcome.
//!
//! The decision is printed and audited before any registry write, so a
//! failed write still leaves the decision on record.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use ccr_audit::events::{
    CHALLENGER_REJECTED, CHAMPION_PROMOTED, DECISION_COMPUTED, REGISTRY_WRITE_FAILED,
};
use ccr_promotion::{
    write_promotion_report_json, PromotionDecision, PromotionEngine, PromotionError,
    PromotionReport, RegistryOp,
};

use super::Ctx;

pub struct PromoteArgs<'a> {
    pub version: u64,
    pub model: Option<&'a str>,
    pub threshold: Option<f64>,
    pub metric: Option<&'a str>,
    pub dry_run: bool,
}

/// Execute `ccr promote`.
pub fn promote(ctx: &Ctx, args: PromoteArgs<'_>) -> Result<()> {
    let model = ctx.model(args.model);
    let mut config = ctx.cfg.promotion.clone();
    if let Some(t) = args.threshold {
        config.threshold = t;
    }
    if let Some(m) = args.metric {
        config.metric = m.to_string();
    }

    let store = ctx.open_store()?;
    let engine = PromotionEngine::new(&store, &store, config)?;

    let challenger = engine.load_challenger(model, args.version)?;
    let decision = engine.evaluate(model, &challenger)?;
    print_decision(&decision);

    let mut audit = ctx.open_audit()?;
    audit.append(model, DECISION_COMPUTED, serde_json::to_value(&decision)?)?;

    let (applied, apply_error) = if args.dry_run {
        (Vec::new(), None)
    } else {
        match engine.apply(&decision) {
            Ok(outcome) => (outcome.applied, None),
            Err(e) => {
                let completed = match &e {
                    PromotionError::RegistryWrite { completed, .. } => completed.clone(),
                    _ => Vec::new(),
                };
                (completed, Some(e))
            }
        }
    };

    let report = PromotionReport {
        generated_at_utc: Utc::now(),
        config: engine.config().clone(),
        decision: decision.clone(),
        apply_requested: !args.dry_run,
        applied: applied.clone(),
        apply_error: apply_error.as_ref().map(|e| e.to_string()),
    };
    let out_dir = ctx.cfg.promotion_export_dir(model);
    let report_path = write_promotion_report_json(&out_dir, &report)
        .with_context(|| format!("write promotion report under {}", out_dir.display()))?;

    if let Some(e) = apply_error {
        audit.append(
            model,
            REGISTRY_WRITE_FAILED,
            json!({
                "challenger_version": decision.challenger_version,
                "completed": applied,
                "error": e.to_string(),
            }),
        )?;
        println!("applied={}", join_ops(&applied));
        println!("report_path={}", report_path.display());
        return Err(e.into());
    }

    if !args.dry_run {
        let event_type = if decision.promoted {
            CHAMPION_PROMOTED
        } else {
            CHALLENGER_REJECTED
        };
        audit.append(
            model,
            event_type,
            json!({
                "challenger_version": decision.challenger_version,
                "champion_version": decision.champion_version,
                "improvement": decision.improvement,
                "applied": applied,
            }),
        )?;
    }

    println!("dry_run={}", args.dry_run);
    println!("applied={}", join_ops(&applied));
    println!("report_path={}", report_path.display());
    Ok(())
}

fn print_decision(d: &PromotionDecision) {
    println!("model={}", d.model_name);
    println!("metric={}", d.metric);
    println!(
        "challenger_version={} challenger_score={:.6}",
        d.challenger_version, d.challenger_score
    );
    println!(
        "champion_version={} champion_score={:.6}",
        d.champion_version, d.champion_score
    );
    println!("improvement={:+.6} threshold={:.6}", d.improvement, d.threshold);
    println!("promoted={}", d.promoted);
    println!("reason={}", d.reason);
}

fn join_ops(ops: &[RegistryOp]) -> String {
    ops.iter().map(RegistryOp::as_str).collect::<Vec<_>>().join(",")
}
