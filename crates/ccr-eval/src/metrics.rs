use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EvalError, EvalResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_positive: u64,
}

impl ConfusionMatrix {
    pub fn total(&self) -> u64 {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

/// Binary classification metrics, serialized in the `metrics.json` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl ClassificationMetrics {
    /// Metric map under the names tracked runs use (`f1`, not `f1_score`).
    pub fn to_run_metrics(&self) -> BTreeMap<String, f64> {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1_score),
            ("roc_auc", self.roc_auc),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the metric set for hard predictions `y_pred` and positive-class
/// scores `y_score` against labels `y_true`.
///
/// Precision, recall and F1 are 0.0 when their denominator is zero.
pub fn evaluate(y_true: &[u8], y_pred: &[u8], y_score: &[f64]) -> EvalResult<ClassificationMetrics> {
    if y_true.len() != y_pred.len() || y_true.len() != y_score.len() {
        return Err(EvalError::LengthMismatch {
            y_true: y_true.len(),
            y_pred: y_pred.len(),
            y_score: y_score.len(),
        });
    }
    if y_true.is_empty() {
        return Err(EvalError::Empty);
    }
    check_binary("y_true", y_true)?;
    check_binary("y_pred", y_pred)?;

    let cm = confusion_matrix(y_true, y_pred);
    let tp = cm.true_positive as f64;
    let fp = cm.false_positive as f64;
    let fn_ = cm.false_negative as f64;

    let accuracy = (cm.true_positive + cm.true_negative) as f64 / cm.total() as f64;
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = ratio(2.0 * precision * recall, precision + recall);
    let roc_auc = roc_auc(y_true, y_score)?;

    let metrics = ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1_score,
        roc_auc,
        confusion_matrix: cm,
    };
    info!(
        rows = y_true.len(),
        accuracy, precision, recall, f1_score, roc_auc, "evaluated predictions"
    );
    Ok(metrics)
}

/// Counts per (label, prediction) cell. Callers pass 0/1 vectors.
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t, p) {
            (0, 0) => cm.true_negative += 1,
            (0, _) => cm.false_positive += 1,
            (_, 0) => cm.false_negative += 1,
            _ => cm.true_positive += 1,
        }
    }
    cm
}

/// Area under the ROC curve as the Mann-Whitney rank statistic. Tied
/// scores share their average rank.
pub fn roc_auc(y_true: &[u8], y_score: &[f64]) -> EvalResult<f64> {
    if y_true.len() != y_score.len() {
        return Err(EvalError::LengthMismatch {
            y_true: y_true.len(),
            y_pred: y_true.len(),
            y_score: y_score.len(),
        });
    }
    if let Some((index, &value)) = y_score.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(EvalError::NonFiniteScore { index, value });
    }
    check_binary("y_true", y_true)?;

    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        let class = y_true.first().copied().unwrap_or(0);
        return Err(EvalError::SingleClass { class });
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| y_score[a].total_cmp(&y_score[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean.
        let avg_rank = (i + j + 2) as f64 / 2.0;
        let pos_in_group = order[i..=j].iter().filter(|&&k| y_true[k] == 1).count();
        rank_sum_pos += avg_rank * pos_in_group as f64;
        i = j + 1;
    }

    let n_pos_f = n_pos as f64;
    let u = rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Ok(u / (n_pos_f * n_neg as f64))
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn check_binary(column: &'static str, values: &[u8]) -> EvalResult<()> {
    match values.iter().enumerate().find(|(_, v)| **v > 1) {
        Some((index, &value)) => Err(EvalError::NonBinaryLabel {
            column,
            index,
            value,
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Finite checks and output
// ---------------------------------------------------------------------------

/// Fail on the first NaN or infinite value, in key order.
pub fn check_metrics_finite(metrics: &BTreeMap<String, f64>) -> EvalResult<()> {
    match metrics.iter().find(|(_, v)| !v.is_finite()) {
        Some((k, v)) => Err(EvalError::NonFiniteMetric {
            metric: k.clone(),
            value: *v,
        }),
        None => Ok(()),
    }
}

/// Write `metrics` as pretty JSON, creating parent directories.
pub fn write_metrics_json(path: &Path, metrics: &ClassificationMetrics) -> EvalResult<()> {
    check_metrics_finite(&metrics.to_run_metrics())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| EvalError::Io(format!("create_dir_all '{}': {e}", parent.display())))?;
    }
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|e| EvalError::Io(format!("serialize metrics: {e}")))?;
    std::fs::write(path, json + "\n")
        .map_err(|e| EvalError::Io(format!("write '{}': {e}", path.display())))?;
    Ok(())
}
