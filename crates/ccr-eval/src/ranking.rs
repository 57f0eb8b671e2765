use std::cmp::Ordering;
use std::collections::BTreeMap;

use ccr_registry::RunRecord;
use serde::Serialize;
use tracing::warn;

/// Secondary keys, compared in order when the primary metric ties.
pub const TIE_BREAK_METRICS: [&str; 3] = ["recall", "f1", "accuracy"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRun {
    pub rank: usize,
    pub run_id: String,
    pub run_name: String,
    pub score: f64,
    pub metrics: BTreeMap<String, f64>,
}

/// A run left out of the ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRun {
    pub run_id: String,
    pub run_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRanking {
    pub metric: String,
    pub ranked: Vec<RankedRun>,
    pub skipped: Vec<SkippedRun>,
}

impl RunRanking {
    pub fn best(&self) -> Option<&RankedRun> {
        self.ranked.first()
    }
}

/// Order runs by `metric`, highest first.
///
/// Ties fall through recall, f1 and accuracy (higher wins, a missing value
/// loses) and finally the run name, then id, ascending. Runs without a
/// finite `metric` are skipped and reported.
pub fn rank_runs(runs: &[RunRecord], metric: &str) -> RunRanking {
    let mut eligible: Vec<&RunRecord> = Vec::new();
    let mut skipped = Vec::new();

    for run in runs {
        let reason = match run.metrics.get(metric) {
            None => Some(format!("metric '{metric}' not logged")),
            Some(v) if !v.is_finite() => Some(format!("metric '{metric}' is {v}")),
            Some(_) => None,
        };
        match reason {
            Some(reason) => {
                warn!(run_id = %run.run_id, run_name = %run.run_name, %reason, "run skipped in ranking");
                skipped.push(SkippedRun {
                    run_id: run.run_id.clone(),
                    run_name: run.run_name.clone(),
                    reason,
                });
            }
            None => eligible.push(run),
        }
    }

    eligible.sort_by(|a, b| compare_runs(a, b, metric));

    let ranked = eligible
        .into_iter()
        .enumerate()
        .map(|(i, run)| RankedRun {
            rank: i + 1,
            run_id: run.run_id.clone(),
            run_name: run.run_name.clone(),
            score: run.metrics.get(metric).copied().unwrap_or(f64::NAN),
            metrics: run.metrics.clone(),
        })
        .collect();

    RunRanking {
        metric: metric.to_string(),
        ranked,
        skipped,
    }
}

/// `Less` means `a` ranks ahead of `b`.
fn compare_runs(a: &RunRecord, b: &RunRecord, metric: &str) -> Ordering {
    std::iter::once(metric)
        .chain(TIE_BREAK_METRICS.iter().copied().filter(|m| *m != metric))
        .map(|m| cmp_desc(a.metrics.get(m), b.metrics.get(m)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.run_name.cmp(&b.run_name))
        .then_with(|| a.run_id.cmp(&b.run_id))
}

/// Descending on finite values; missing or non-finite sorts last.
fn cmp_desc(a: Option<&f64>, b: Option<&f64>) -> Ordering {
    let a = a.copied().filter(|v| v.is_finite());
    let b = b.copied().filter(|v| v.is_finite());
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
