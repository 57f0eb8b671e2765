use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ccr_config::CommandMode;

mod commands;

use commands::Ctx;

#[derive(Parser)]
#[command(name = "ccr")]
#[command(about = "Customer-churn model lifecycle CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> local). Defaults apply when omitted.
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Registry store directory. Overrides CCR_STORE_ROOT and `store.root`.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Customer dataset commands
    Data {
        #[command(subcommand)]
        cmd: DataCmd,
    },

    /// Score a predictions CSV and write metrics.json
    Eval {
        /// CSV with columns y_true,y_pred,y_score
        #[arg(long)]
        predictions: PathBuf,

        #[arg(long, default_value = "metrics.json")]
        out: PathBuf,

        /// Also log the metrics to this tracked run
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Experiment tracking
    Runs {
        #[command(subcommand)]
        cmd: RunsCmd,
    },

    /// Model registry inspection and manual edits
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },

    /// Champion/challenger gate: promote a version or record its rejection
    Promote {
        /// Challenger version
        #[arg(long)]
        version: u64,

        /// Registered model (default: model.name)
        #[arg(long)]
        model: Option<String>,

        /// Minimum improvement (default: promotion.threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Metric compared (default: promotion.metric)
        #[arg(long)]
        metric: Option<String>,

        /// Compute and report the decision without touching the registry
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Audit trail utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum DataCmd {
    /// Write a seeded synthetic customer table
    Generate {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        n_samples: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Drop age outliers and append new customers (next dataset version)
    Refresh {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Defaults to overwriting the input
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dedupe, impute, drop text columns, add derived features
    Preprocess {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the preprocessing report as JSON here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compare two dataset versions
    Compare {
        older: PathBuf,
        newer: PathBuf,
    },

    /// Write train.csv and test.csv from the processed table
    Split {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum RunsCmd {
    /// Record a training run: configured hyperparameters, metrics, tags
    Log {
        /// random-forest | gradient-boosting
        #[arg(long)]
        family: String,

        #[arg(long)]
        name: String,

        /// JSON file of metrics (flat map or metrics.json layout)
        #[arg(long)]
        metrics: PathBuf,

        /// Experiment (default: model.experiment)
        #[arg(long)]
        experiment: Option<String>,

        /// Register the run as the next model version
        #[arg(long, default_value_t = false)]
        register: bool,

        /// Extra run tag, repeatable: --tag data_version=v2
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Rank an experiment's runs by a metric
    Compare {
        #[arg(long)]
        experiment: Option<String>,
        /// Default: promotion.metric
        #[arg(long)]
        metric: Option<String>,
    },
}

#[derive(Subcommand)]
enum RegistryCmd {
    /// Print versions, aliases and descriptions
    List {
        #[arg(long)]
        model: Option<String>,
    },

    /// Point an alias at a version (bootstraps the first champion)
    SetAlias {
        #[arg(long)]
        version: u64,
        /// Default: promotion.champion_alias
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },

    /// Set the model description, or a version's with --version
    Describe {
        #[arg(long)]
        text: String,
        #[arg(long)]
        version: Option<u64>,
        #[arg(long)]
        model: Option<String>,
    },

    /// Set a model tag, or a version tag with --version
    Tag {
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
        #[arg(long)]
        version: Option<u64>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of an audit JSONL file
    Verify {
        /// Default: <exports.root>/audit/audit.jsonl
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let load = |mode: CommandMode| Ctx::load(&cli.config_paths, cli.store.clone(), mode);

    match cli.cmd {
        Commands::ConfigHash { ref paths } => {
            let loaded = ccr_config::load_layered_yaml(paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Data { ref cmd } => {
            let ctx = load(CommandMode::Data)?;
            match cmd {
                DataCmd::Generate {
                    out,
                    n_samples,
                    seed,
                } => commands::data::generate(&ctx, out.clone(), *n_samples, *seed)?,
                DataCmd::Refresh { input, out } => {
                    commands::data::refresh(&ctx, input.clone(), out.clone())?
                }
                DataCmd::Preprocess { input, out, report } => {
                    commands::data::preprocess(&ctx, input.clone(), out.clone(), report.clone())?
                }
                DataCmd::Compare { older, newer } => commands::data::compare(older, newer)?,
                DataCmd::Split { input, out_dir } => {
                    commands::data::split(&ctx, input.clone(), out_dir)?
                }
            }
        }

        Commands::Eval {
            ref predictions,
            ref out,
            ref run_id,
        } => {
            let ctx = load(CommandMode::Track)?;
            commands::runs::eval(&ctx, predictions, out, run_id.as_deref())?;
        }

        Commands::Runs { ref cmd } => {
            let ctx = load(CommandMode::Track)?;
            match cmd {
                RunsCmd::Log {
                    family,
                    name,
                    metrics,
                    experiment,
                    register,
                    tags,
                } => commands::runs::log(
                    &ctx,
                    commands::runs::LogArgs {
                        family,
                        name,
                        metrics_path: metrics,
                        experiment: experiment.as_deref(),
                        register: *register,
                        tags,
                    },
                )?,
                RunsCmd::Compare { experiment, metric } => {
                    commands::runs::compare(&ctx, experiment.as_deref(), metric.as_deref())?
                }
            }
        }

        Commands::Registry { ref cmd } => {
            let ctx = load(CommandMode::Promote)?;
            match cmd {
                RegistryCmd::List { model } => commands::registry::list(&ctx, model.as_deref())?,
                RegistryCmd::SetAlias {
                    version,
                    alias,
                    model,
                } => commands::registry::set_alias(
                    &ctx,
                    model.as_deref(),
                    alias.as_deref(),
                    *version,
                )?,
                RegistryCmd::Describe {
                    text,
                    version,
                    model,
                } => commands::registry::describe(&ctx, model.as_deref(), *version, text)?,
                RegistryCmd::Tag {
                    key,
                    value,
                    version,
                    model,
                } => commands::registry::tag(&ctx, model.as_deref(), *version, key, value)?,
            }
        }

        Commands::Promote {
            version,
            ref model,
            threshold,
            ref metric,
            dry_run,
        } => {
            let ctx = load(CommandMode::Promote)?;
            commands::promote::promote(
                &ctx,
                commands::promote::PromoteArgs {
                    version,
                    model: model.as_deref(),
                    threshold,
                    metric: metric.as_deref(),
                    dry_run,
                },
            )?;
        }

        Commands::Audit {
            cmd: AuditCmd::Verify { ref path },
        } => {
            let path = match path {
                Some(p) => p.clone(),
                None => load(CommandMode::Promote)?.cfg.audit_log_path(),
            };
            commands::audit_verify(&path)?;
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
