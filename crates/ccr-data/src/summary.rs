use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{DataError, DataResult};
use crate::record::{CustomerRecord, NUMERIC_COLUMNS, STRING_COLUMNS};

/// Shape and label statistics of one dataset version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub columns: Vec<String>,
    /// Mean of the non-blank `churn` cells; `None` without the column or values.
    pub churn_rate: Option<f64>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub missing_cells: usize,
}

/// Differences from an older to a newer version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetComparison {
    pub older: DatasetSummary,
    pub newer: DatasetSummary,
    pub records_delta: i64,
    /// In percentage points.
    pub churn_rate_delta_pp: Option<f64>,
    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
}

impl DatasetComparison {
    pub fn schema_unchanged(&self) -> bool {
        self.columns_added.is_empty() && self.columns_removed.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    records: usize,
    churn_sum: f64,
    churn_n: usize,
    age_min: Option<f64>,
    age_max: Option<f64>,
    missing: usize,
}

impl Accumulator {
    fn age(&mut self, a: f64) {
        self.age_min = Some(self.age_min.map_or(a, |m| m.min(a)));
        self.age_max = Some(self.age_max.map_or(a, |m| m.max(a)));
    }

    fn churn(&mut self, c: f64) {
        self.churn_sum += c;
        self.churn_n += 1;
    }

    fn finish(self, columns: Vec<String>) -> DatasetSummary {
        DatasetSummary {
            records: self.records,
            columns,
            churn_rate: (self.churn_n > 0).then(|| self.churn_sum / self.churn_n as f64),
            age_min: self.age_min,
            age_max: self.age_max,
            missing_cells: self.missing,
        }
    }
}

/// Summary of an in-memory raw table.
pub fn summarize(rows: &[CustomerRecord]) -> DatasetSummary {
    let mut acc = Accumulator::default();
    for r in rows {
        acc.records += 1;
        if let Some(a) = r.age {
            acc.age(f64::from(a));
        }
        if let Some(c) = r.churn {
            acc.churn(f64::from(c));
        }
        acc.missing += NUMERIC_COLUMNS
            .iter()
            .filter(|c| r.numeric(c).is_none())
            .count();
        acc.missing += usize::from(r.contract_type.is_none());
        acc.missing += usize::from(r.payment_method.is_none());
    }

    let columns = std::iter::once("customer_id")
        .chain(NUMERIC_COLUMNS.iter().take(7).copied())
        .chain(STRING_COLUMNS)
        .chain(std::iter::once("churn"))
        .map(str::to_string)
        .collect();
    acc.finish(columns)
}

/// Summary of any CSV with a header row. `age` and `churn` statistics are
/// computed when those columns exist.
pub fn summarize_csv<R: Read>(reader: R) -> DataResult<DatasetSummary> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    let age_idx = headers.iter().position(|h| h == "age");
    let churn_idx = headers.iter().position(|h| h == "churn");

    let mut acc = Accumulator::default();
    for rec in rdr.records() {
        let rec = rec?;
        acc.records += 1;
        acc.missing += rec.iter().filter(|f| f.trim().is_empty()).count();
        if let Some(a) = age_idx.and_then(|i| parse_cell(rec.get(i))) {
            acc.age(a);
        }
        if let Some(c) = churn_idx.and_then(|i| parse_cell(rec.get(i))) {
            acc.churn(c);
        }
    }
    Ok(acc.finish(columns))
}

pub fn summarize_path(path: &Path) -> DataResult<DatasetSummary> {
    let f = std::fs::File::open(path)
        .map_err(|e| DataError::Io(format!("open '{}': {e}", path.display())))?;
    summarize_csv(f)
}

fn parse_cell(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
}

pub fn compare_datasets(older: DatasetSummary, newer: DatasetSummary) -> DatasetComparison {
    let old_cols: BTreeSet<&String> = older.columns.iter().collect();
    let new_cols: BTreeSet<&String> = newer.columns.iter().collect();
    let columns_added = new_cols.difference(&old_cols).map(|c| c.to_string()).collect();
    let columns_removed = old_cols.difference(&new_cols).map(|c| c.to_string()).collect();

    let churn_rate_delta_pp = match (older.churn_rate, newer.churn_rate) {
        (Some(a), Some(b)) => Some((b - a) * 100.0),
        _ => None,
    };

    DatasetComparison {
        records_delta: newer.records as i64 - older.records as i64,
        churn_rate_delta_pp,
        columns_added,
        columns_removed,
        older,
        newer,
    }
}

/// Hex SHA-256 of a file's bytes, for pinning a dataset version.
pub fn fingerprint_file(path: &Path) -> DataResult<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| DataError::Io(format!("read '{}': {e}", path.display())))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
