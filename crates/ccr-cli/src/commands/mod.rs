//! Command handler modules for the `ccr` binary.
//!
//! Shared loading (config, store, audit log) lives here. Command-specific
//! logic lives in the submodules.

pub mod data;
pub mod promote;
pub mod registry;
pub mod runs;

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use ccr_audit::{AuditWriter, VerifyResult};
use ccr_config::{
    report_unknown_keys, report_unused_keys, CommandMode, LoadedConfig, PipelineConfig,
    UnusedKeyPolicy,
};
use ccr_registry::FileStore;

/// Env override for the registry store directory.
pub const ENV_STORE_ROOT: &str = "CCR_STORE_ROOT";

/// Everything a command needs from the environment.
pub struct Ctx {
    pub loaded: LoadedConfig,
    pub cfg: PipelineConfig,
    pub store_root: PathBuf,
}

impl Ctx {
    /// Merge config layers and resolve the store root
    /// (`--store`, then `CCR_STORE_ROOT`, then `store.root`).
    pub fn load(config_paths: &[String], store: Option<PathBuf>, mode: CommandMode) -> Result<Self> {
        let loaded = if config_paths.is_empty() {
            ccr_config::load_layered_yaml_from_strings(&[])?
        } else {
            ccr_config::load_layered_yaml(config_paths)?
        };

        let unknown = report_unknown_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        for key in &unknown.unused_leaf_pointers {
            warn!(key = %key, "config key is not read by any command");
        }
        let unused = report_unused_keys(mode, &loaded.config_json, UnusedKeyPolicy::Warn)?;
        debug!(
            mode = mode.as_str(),
            unused = unused.unused_leaf_pointers.len(),
            config_hash = %loaded.config_hash,
            "config loaded"
        );

        let cfg = loaded.pipeline()?;
        let store_root = store
            .or_else(|| std::env::var_os(ENV_STORE_ROOT).map(PathBuf::from))
            .unwrap_or_else(|| cfg.store.root.clone());

        Ok(Self {
            loaded,
            cfg,
            store_root,
        })
    }

    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(&self.store_root)
            .with_context(|| format!("open registry store {}", self.store_root.display()))
    }

    /// Continue the hash-chained audit log under `exports.root`.
    pub fn open_audit(&self) -> Result<AuditWriter> {
        AuditWriter::resume(self.cfg.audit_log_path(), true, Uuid::new_v4())
    }

    /// `--model` or the configured model name.
    pub fn model<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.unwrap_or(&self.cfg.model.name)
    }
}

/// Parse repeated `key=value` flags.
pub fn parse_tags(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for t in raw {
        let (k, v) = t
            .split_once('=')
            .with_context(|| format!("invalid --tag '{t}', expected key=value"))?;
        let k = k.trim();
        if k.is_empty() {
            bail!("invalid --tag '{t}', empty key");
        }
        out.insert(k.to_string(), v.trim().to_string());
    }
    Ok(out)
}

/// Read a metrics JSON file into a flat map.
///
/// Accepts either a flat `{name: number}` object or the `metrics.json`
/// layout; `f1_score` is logged as `f1` and non-numeric entries are skipped.
pub fn load_metrics_file(path: &Path) -> Result<BTreeMap<String, f64>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read metrics file failed: {}", path.display()))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let v: serde_json::Value =
        serde_json::from_slice(bytes).context("metrics file must contain valid JSON")?;
    let obj = v
        .as_object()
        .context("metrics file must contain a JSON object")?;

    let mut out = BTreeMap::new();
    for (k, v) in obj {
        if let Some(x) = v.as_f64() {
            let key = if k == "f1_score" { "f1" } else { k.as_str() };
            out.insert(key.to_string(), x);
        }
    }
    if out.is_empty() {
        bail!("metrics file {} has no numeric metrics", path.display());
    }
    Ok(out)
}

/// Execute `ccr audit verify`.
pub fn audit_verify(path: &Path) -> Result<()> {
    match ccr_audit::verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("audit_chain_valid=true lines={lines} path={}", path.display());
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("audit_chain_valid=false line={line} path={}", path.display());
            bail!("AUDIT_CHAIN_BROKEN line={line}: {reason}")
        }
    }
}
