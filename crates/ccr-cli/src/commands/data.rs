//! Dataset command handlers: `ccr data generate|refresh|preprocess|compare|split`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use ccr_data::{
    compare_datasets, fingerprint_file, generate_customers, preprocess as preprocess_rows,
    read_customers, read_processed, refresh_dataset, summarize_path, train_test_split,
    write_customers, write_processed, GenerateParams, ProcessedRecord, RefreshParams,
};

use super::Ctx;

/// Execute `ccr data generate`.
pub fn generate(
    ctx: &Ctx,
    out: Option<PathBuf>,
    n_samples: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let out = out.unwrap_or_else(|| ctx.cfg.data.raw_path.clone());
    let params = GenerateParams {
        n_samples: n_samples.unwrap_or(ctx.cfg.data.n_samples),
        seed: seed.unwrap_or(ctx.cfg.data.seed),
        churn_rate: ctx.cfg.data.churn_rate,
        ..GenerateParams::default()
    };

    let rows = generate_customers(&params)?;
    write_customers(&out, &rows)?;
    let summary = summarize_path(&out)?;

    println!("generated=true records={}", summary.records);
    println!("churn_rate={:.4}", summary.churn_rate.unwrap_or(0.0));
    println!("path={}", out.display());
    println!("sha256={}", fingerprint_file(&out)?);
    Ok(())
}

/// Execute `ccr data refresh`.
pub fn refresh(ctx: &Ctx, input: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| ctx.cfg.data.raw_path.clone());
    let out = out.unwrap_or_else(|| input.clone());
    let r = &ctx.cfg.refresh;
    let params = RefreshParams {
        max_age: r.max_age,
        new_records: r.new_records,
        seed: r.seed,
        churn_rate: r.churn_rate,
    };

    let existing = read_customers(&input)?;
    let (rows, report) = refresh_dataset(existing, &params)?;
    write_customers(&out, &rows)?;

    println!("refreshed=true");
    println!(
        "records_before={} removed={} added={} records_after={}",
        report.before.records, report.removed, report.added, report.after.records
    );
    println!("first_new_id={}", report.first_new_id);
    println!("path={}", out.display());
    println!("sha256={}", fingerprint_file(&out)?);
    Ok(())
}

/// Execute `ccr data preprocess`.
pub fn preprocess(
    ctx: &Ctx,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let input = input.unwrap_or_else(|| ctx.cfg.data.raw_path.clone());
    let out = out.unwrap_or_else(|| ctx.cfg.data.processed_path.clone());

    let raw = read_customers(&input)?;
    let (rows, report) = preprocess_rows(&raw);
    write_processed(&out, &rows)?;

    if let Some(p) = &report_path {
        let json = serde_json::to_string_pretty(&report).context("serialize report json failed")?;
        std::fs::write(p, json).with_context(|| format!("write report failed: {}", p.display()))?;
        println!("report_path={}", p.display());
    }

    println!(
        "input_records={} duplicates_removed={} missing_filled={} output_records={}",
        report.input_records, report.duplicates_removed, report.missing_filled, report.output_records
    );
    println!("derived_columns={}", report.derived_columns.join(","));
    println!("path={}", out.display());
    Ok(())
}

/// Execute `ccr data compare`.
pub fn compare(older: &Path, newer: &Path) -> Result<()> {
    let cmp = compare_datasets(summarize_path(older)?, summarize_path(newer)?);

    println!("records_older={} records_newer={}", cmp.older.records, cmp.newer.records);
    println!("records_delta={:+}", cmp.records_delta);
    match cmp.churn_rate_delta_pp {
        Some(d) => println!("churn_rate_delta_pp={d:+.2}"),
        None => println!("churn_rate_delta_pp="),
    }
    println!("columns_added={}", cmp.columns_added.join(","));
    println!("columns_removed={}", cmp.columns_removed.join(","));
    println!("schema_unchanged={}", cmp.schema_unchanged());
    Ok(())
}

/// Execute `ccr data split`.
pub fn split(ctx: &Ctx, input: Option<PathBuf>, out_dir: &Path) -> Result<()> {
    let input = input.unwrap_or_else(|| ctx.cfg.data.processed_path.clone());
    let rows = read_processed(&input)?;
    let labels: Vec<u8> = rows.iter().map(ProcessedRecord::label).collect();

    let s = &ctx.cfg.split;
    let split = train_test_split(&labels, s.test_size, s.seed, s.stratify)?;
    let pick = |idx: &[usize]| -> Vec<ProcessedRecord> { idx.iter().map(|&i| rows[i].clone()).collect() };

    let train_path = out_dir.join("train.csv");
    let test_path = out_dir.join("test.csv");
    write_processed(&train_path, &pick(&split.train))?;
    write_processed(&test_path, &pick(&split.test))?;

    println!("train_rows={} test_rows={}", split.train.len(), split.test.len());
    println!("train_path={}", train_path.display());
    println!("test_path={}", test_path.display());
    Ok(())
}
