use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PromotionConfig;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A freshly trained and registered candidate: the triple produced by the
/// training side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenger {
    pub version: u64,
    pub run_id: String,
    pub score: f64,
}

/// The version currently holding the champion alias, with its recorded score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub version: u64,
    pub run_id: String,
    pub score: f64,
    pub description: Option<String>,
}

/// Which side of the comparison a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRole {
    Challenger,
    Champion,
}

impl fmt::Display for ScoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRole::Challenger => write!(f, "challenger"),
            ScoreRole::Champion => write!(f, "champion"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Result of comparing a challenger with the current champion.
///
/// Computed once per invocation. The engine never persists it; only its
/// consequences reach the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub model_name: String,
    pub metric: String,
    pub challenger_version: u64,
    pub champion_version: u64,
    pub challenger_score: f64,
    pub champion_score: f64,
    pub threshold: f64,
    /// `challenger_score - champion_score`.
    pub improvement: f64,
    pub promoted: bool,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Registry mutations the engine may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryOp {
    /// Move the champion alias to the challenger.
    ReassignAlias,
    /// Record the demotion on the previous champion's description.
    UpdateDescription,
    /// Tag a rejected challenger.
    SetVersionTag,
}

impl RegistryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryOp::ReassignAlias => "reassign_alias",
            RegistryOp::UpdateDescription => "update_version_description",
            RegistryOp::SetVersionTag => "set_version_tag",
        }
    }
}

impl fmt::Display for RegistryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision together with the mutations that were applied for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionOutcome {
    pub decision: PromotionDecision,
    /// In the order performed.
    pub applied: Vec<RegistryOp>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Promotion report artifact (serializable to JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionReport {
    pub generated_at_utc: DateTime<Utc>,
    pub config: PromotionConfig,
    pub decision: PromotionDecision,
    /// False for dry runs.
    pub apply_requested: bool,
    pub applied: Vec<RegistryOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_error: Option<String>,
}

/// Write the report as pretty-printed JSON to
/// `out_dir/promotion_v<challenger_version>.json`. Returns the path written.
pub fn write_promotion_report_json(
    out_dir: &Path,
    report: &PromotionReport,
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!(
        "promotion_v{}.json",
        report.decision.challenger_version
    ));
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(path)
}
