//! Classification metrics for a churn model's predictions, and ranking of
//! tracked experiment runs by a chosen metric.

mod error;
mod metrics;
mod predictions;
mod ranking;

pub use error::{EvalError, EvalResult};
pub use metrics::{
    check_metrics_finite, confusion_matrix, evaluate, roc_auc, write_metrics_json,
    ClassificationMetrics, ConfusionMatrix,
};
pub use predictions::{read_predictions, read_predictions_from, Predictions};
pub use ranking::{rank_runs, RankedRun, RunRanking, SkippedRun, TIE_BREAK_METRICS};
