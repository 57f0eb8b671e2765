use std::fmt;

/// Errors from metric computation and prediction I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// No rows to evaluate.
    Empty,
    /// Input vectors disagree in length.
    LengthMismatch {
        y_true: usize,
        y_pred: usize,
        y_score: usize,
    },
    /// A label outside {0, 1}.
    NonBinaryLabel {
        column: &'static str,
        index: usize,
        value: u8,
    },
    /// A score that is NaN or infinite.
    NonFiniteScore { index: usize, value: f64 },
    /// ROC-AUC is undefined with a single class present.
    SingleClass { class: u8 },
    /// A computed or logged metric is NaN or infinite.
    NonFiniteMetric { metric: String, value: f64 },
    Io(String),
    Csv(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Empty => write!(f, "EVAL_EMPTY no rows to evaluate"),
            EvalError::LengthMismatch {
                y_true,
                y_pred,
                y_score,
            } => write!(
                f,
                "EVAL_LENGTH_MISMATCH y_true={y_true} y_pred={y_pred} y_score={y_score}"
            ),
            EvalError::NonBinaryLabel {
                column,
                index,
                value,
            } => write!(f, "EVAL_NON_BINARY_LABEL column={column} row={index} value={value}"),
            EvalError::NonFiniteScore { index, value } => {
                write!(f, "EVAL_NON_FINITE_SCORE row={index} value={value}")
            }
            EvalError::SingleClass { class } => write!(
                f,
                "EVAL_SINGLE_CLASS only class {class} present in y_true; roc_auc is undefined"
            ),
            EvalError::NonFiniteMetric { metric, value } => {
                write!(f, "EVAL_NON_FINITE_METRIC metric={metric} value={value}")
            }
            EvalError::Io(msg) => write!(f, "EVAL_IO {msg}"),
            EvalError::Csv(msg) => write!(f, "EVAL_CSV {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<csv::Error> for EvalError {
    fn from(e: csv::Error) -> Self {
        EvalError::Csv(e.to_string())
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
