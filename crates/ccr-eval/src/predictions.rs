use std::path::Path;

use serde::Deserialize;

use crate::error::{EvalError, EvalResult};

/// Column-oriented predictions for one evaluation set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predictions {
    pub y_true: Vec<u8>,
    pub y_pred: Vec<u8>,
    pub y_score: Vec<f64>,
}

#[derive(Deserialize)]
struct Row {
    y_true: u8,
    y_pred: u8,
    y_score: f64,
}

/// Read a predictions CSV with header `y_true,y_pred,y_score`. Extra
/// columns are ignored.
pub fn read_predictions(path: &Path) -> EvalResult<Predictions> {
    let file = std::fs::File::open(path)
        .map_err(|e| EvalError::Io(format!("open '{}': {e}", path.display())))?;
    read_predictions_from(file)
}

pub fn read_predictions_from<R: std::io::Read>(reader: R) -> EvalResult<Predictions> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Predictions::default();
    for row in rdr.deserialize() {
        let row: Row = row?;
        out.y_true.push(row.y_true);
        out.y_pred.push(row.y_pred);
        out.y_score.push(row.y_score);
    }
    Ok(out)
}
