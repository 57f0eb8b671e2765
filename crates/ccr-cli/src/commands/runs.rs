//! Tracking command handlers: `ccr eval`, `ccr runs log`, `ccr runs compare`.
//!
//! Training happens outside this tool. A run is recorded from the
//! configured hyperparameters for its family plus the metrics file the
//! trainer (or `ccr eval`) produced.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use ccr_audit::events::VERSION_REGISTERED;
use ccr_config::ModelFamily;
use ccr_eval::{check_metrics_finite, evaluate, rank_runs, read_predictions, write_metrics_json};
use ccr_registry::{NewRun, Tracker};

use super::{load_metrics_file, parse_tags, Ctx};

/// Execute `ccr eval`.
pub fn eval(ctx: &Ctx, predictions: &Path, out: &Path, run_id: Option<&str>) -> Result<()> {
    let p = read_predictions(predictions)?;
    let m = evaluate(&p.y_true, &p.y_pred, &p.y_score)?;
    write_metrics_json(out, &m)?;

    println!("accuracy={:.6}", m.accuracy);
    println!("precision={:.6}", m.precision);
    println!("recall={:.6}", m.recall);
    println!("f1_score={:.6}", m.f1_score);
    println!("roc_auc={:.6}", m.roc_auc);
    let cm = &m.confusion_matrix;
    println!(
        "confusion_matrix tn={} fp={} fn={} tp={}",
        cm.true_negative, cm.false_positive, cm.false_negative, cm.true_positive
    );
    println!("metrics_path={}", out.display());

    if let Some(run_id) = run_id {
        let store = ctx.open_store()?;
        store
            .log_metrics(run_id, &m.to_run_metrics())
            .with_context(|| format!("log metrics to run {run_id}"))?;
        println!("logged_to_run={run_id}");
    }
    Ok(())
}

pub struct LogArgs<'a> {
    pub family: &'a str,
    pub name: &'a str,
    pub metrics_path: &'a Path,
    pub experiment: Option<&'a str>,
    pub register: bool,
    pub tags: &'a [String],
}

/// Execute `ccr runs log`.
pub fn log(ctx: &Ctx, args: LogArgs<'_>) -> Result<()> {
    let family: ModelFamily = args.family.parse()?;
    let params = ctx.cfg.models.params_for(family);
    params.validate()?;

    let metrics = load_metrics_file(args.metrics_path)?;
    check_metrics_finite(&metrics)?;

    let mut tags = parse_tags(args.tags)?;
    tags.entry("model_type".to_string())
        .or_insert_with(|| family.to_string());
    tags.insert("config_hash".to_string(), ctx.loaded.config_hash.clone());

    let experiment = args.experiment.unwrap_or(&ctx.cfg.model.experiment);
    let store = ctx.open_store()?;
    let run = store.create_run(NewRun {
        experiment: experiment.to_string(),
        run_name: args.name.to_string(),
        tags,
    })?;
    store.log_params(&run.run_id, &params.to_param_map())?;
    store.log_metrics(&run.run_id, &metrics)?;
    info!(run_id = %run.run_id, experiment, family = %family, "run logged");

    println!("run_id={}", run.run_id);
    println!("experiment={experiment}");
    println!("family={family}");

    if args.register {
        let model = ctx.cfg.model.name.as_str();
        let mv = store.register_version(model, &run.run_id)?;
        let mut audit = ctx.open_audit()?;
        audit.append(
            model,
            VERSION_REGISTERED,
            serde_json::json!({
                "version": mv.version,
                "run_id": mv.run_id,
                "metrics": metrics,
            }),
        )?;
        println!("registered=true model={} version={}", model, mv.version);
    }
    Ok(())
}

/// Execute `ccr runs compare`.
pub fn compare(ctx: &Ctx, experiment: Option<&str>, metric: Option<&str>) -> Result<()> {
    let experiment = experiment.unwrap_or(&ctx.cfg.model.experiment);
    let metric = metric.unwrap_or(&ctx.cfg.promotion.metric);

    let store = ctx.open_store()?;
    let runs = store.search_runs(experiment)?;
    let ranking = rank_runs(&runs, metric);

    println!("experiment={experiment} metric={metric} runs={}", runs.len());
    for r in &ranking.ranked {
        println!(
            "rank={} run_id={} run_name={} {}={:.4} recall={} accuracy={}",
            r.rank,
            r.run_id,
            r.run_name,
            metric,
            r.score,
            fmt_opt(r.metrics.get("recall")),
            fmt_opt(r.metrics.get("accuracy")),
        );
    }
    for s in &ranking.skipped {
        println!("skipped run_id={} run_name={} reason={}", s.run_id, s.run_name, s.reason);
    }
    match ranking.best() {
        Some(best) => println!("best_run={} best_run_id={}", best.run_name, best.run_id),
        None => println!("best_run="),
    }
    Ok(())
}

fn fmt_opt(v: Option<&f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}
