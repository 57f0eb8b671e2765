use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::record::{CustomerRecord, ProcessedRecord, NUMERIC_COLUMNS, STRING_COLUMNS};

/// What preprocessing did to the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessReport {
    pub input_records: usize,
    pub duplicates_removed: usize,
    /// Median used per imputed column. Columns without gaps are absent.
    pub imputed_medians: BTreeMap<String, f64>,
    pub missing_filled: usize,
    pub dropped_columns: Vec<String>,
    pub derived_columns: Vec<String>,
    pub output_records: usize,
}

pub const DERIVED_COLUMNS: [&str; 3] = [
    "avg_monthly_charge",
    "estimated_lifetime_value",
    "products_per_tenure_month",
];

/// Clean a raw table into model-ready rows.
///
/// Steps, in order: keep the first row per `customer_id`, fill numeric gaps
/// with the column median, drop text columns, add derived features.
pub fn preprocess(rows: &[CustomerRecord]) -> (Vec<ProcessedRecord>, PreprocessReport) {
    let mut seen = HashSet::new();
    let unique: Vec<&CustomerRecord> = rows
        .iter()
        .filter(|r| seen.insert(r.customer_id))
        .collect();

    let mut medians = BTreeMap::new();
    let mut missing_filled = 0usize;
    for col in NUMERIC_COLUMNS {
        let gaps = unique.iter().filter(|r| r.numeric(col).is_none()).count();
        if gaps == 0 {
            continue;
        }
        let values: Vec<f64> = unique.iter().filter_map(|r| r.numeric(col)).collect();
        // An all-blank column has no median; fall back to 0.
        let m = median(values).unwrap_or(0.0);
        medians.insert(col.to_string(), m);
        missing_filled += gaps;
    }

    let fill = |r: &CustomerRecord, col: &str| -> f64 {
        r.numeric(col)
            .or_else(|| medians.get(col).copied())
            .unwrap_or(0.0)
    };

    let out: Vec<ProcessedRecord> = unique
        .iter()
        .map(|r| {
            let tenure = fill(r, "tenure_months");
            let monthly = fill(r, "monthly_charges");
            let total = fill(r, "total_charges");
            let products = fill(r, "num_products");
            ProcessedRecord {
                customer_id: r.customer_id,
                age: fill(r, "age"),
                tenure_months: tenure,
                monthly_charges: monthly,
                total_charges: total,
                num_products: products,
                has_phone: fill(r, "has_phone"),
                has_internet: fill(r, "has_internet"),
                churn: fill(r, "churn"),
                avg_monthly_charge: total / (tenure + 1.0),
                estimated_lifetime_value: monthly * tenure,
                products_per_tenure_month: products / (tenure + 1.0),
            }
        })
        .collect();

    let report = PreprocessReport {
        input_records: rows.len(),
        duplicates_removed: rows.len() - unique.len(),
        imputed_medians: medians,
        missing_filled,
        dropped_columns: STRING_COLUMNS.iter().map(|s| s.to_string()).collect(),
        derived_columns: DERIVED_COLUMNS.iter().map(|s| s.to_string()).collect(),
        output_records: out.len(),
    };
    info!(
        input = report.input_records,
        duplicates = report.duplicates_removed,
        filled = report.missing_filled,
        output = report.output_records,
        "preprocessed dataset"
    );
    (out, report)
}

/// Median with the midpoint rule for even counts. `None` when empty.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    })
}
