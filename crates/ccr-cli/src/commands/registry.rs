//! Registry command handlers: `ccr registry list|set-alias|describe|tag`.

use anyhow::Result;
use tracing::info;

use ccr_audit::events::ALIAS_SET;
use ccr_registry::ModelRegistry;

use super::Ctx;

/// Execute `ccr registry list`.
pub fn list(ctx: &Ctx, model: Option<&str>) -> Result<()> {
    let model = ctx.model(model);
    let store = ctx.open_store()?;
    let summary = store.get_model(model)?;
    let versions = store.list_versions(model)?;

    println!("model={}", summary.name);
    println!("description={}", summary.description.as_deref().unwrap_or(""));
    for (k, v) in &summary.tags {
        println!("model_tag {k}={v}");
    }
    println!(
        "latest_version={}",
        summary.latest_version.map(|v| v.to_string()).unwrap_or_default()
    );
    for v in &versions {
        println!(
            "version={} run_id={} aliases={} created_at_utc={}",
            v.version,
            v.run_id,
            v.aliases.join(","),
            v.created_at_utc.to_rfc3339()
        );
        if let Some(d) = &v.description {
            println!("  description={}", d.replace('\n', " | "));
        }
        for (k, val) in &v.tags {
            println!("  tag {k}={val}");
        }
    }
    Ok(())
}

/// Execute `ccr registry set-alias`.
pub fn set_alias(ctx: &Ctx, model: Option<&str>, alias: Option<&str>, version: u64) -> Result<()> {
    let model = ctx.model(model);
    let alias = alias.unwrap_or(&ctx.cfg.promotion.champion_alias);
    let store = ctx.open_store()?;

    let previous = match store.get_version_by_alias(model, alias) {
        Ok(mv) => Some(mv.version),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };
    store.reassign_alias(model, alias, version)?;
    info!(model, alias, version, previous = ?previous, "alias set");

    let mut audit = ctx.open_audit()?;
    audit.append(
        model,
        ALIAS_SET,
        serde_json::json!({ "alias": alias, "version": version, "previous": previous }),
    )?;

    println!("alias_set=true model={model} alias={alias} version={version}");
    println!(
        "previous_version={}",
        previous.map(|v| v.to_string()).unwrap_or_default()
    );
    Ok(())
}

/// Execute `ccr registry describe`.
pub fn describe(ctx: &Ctx, model: Option<&str>, version: Option<u64>, text: &str) -> Result<()> {
    let model = ctx.model(model);
    let store = ctx.open_store()?;
    match version {
        Some(v) => {
            store.update_version_description(model, v, text)?;
            println!("described=true model={model} version={v}");
        }
        None => {
            store.set_model_description(model, text)?;
            println!("described=true model={model}");
        }
    }
    Ok(())
}

/// Execute `ccr registry tag`.
pub fn tag(
    ctx: &Ctx,
    model: Option<&str>,
    version: Option<u64>,
    key: &str,
    value: &str,
) -> Result<()> {
    let model = ctx.model(model);
    let store = ctx.open_store()?;
    match version {
        Some(v) => {
            store.set_version_tag(model, v, key, value)?;
            println!("tagged=true model={model} version={v} {key}={value}");
        }
        None => {
            store.set_model_tag(model, key, value)?;
            println!("tagged=true model={model} {key}={value}");
        }
    }
    Ok(())
}
