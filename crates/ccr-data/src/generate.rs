use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::error::{DataError, DataResult};
use crate::record::{CustomerRecord, CONTRACT_TYPES, PAYMENT_METHODS};
use crate::summary::{summarize, DatasetSummary};

/// Synthetic customer generation. Same params, same rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub n_samples: usize,
    pub seed: u64,
    /// Bernoulli probability of `churn = 1`.
    pub churn_rate: f64,
    pub first_id: u64,
    /// Exclusive upper bound for `age`.
    pub age_limit: u32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            n_samples: 10_000,
            seed: 42,
            churn_rate: 0.3,
            first_id: 1,
            age_limit: 80,
        }
    }
}

pub fn generate_customers(params: &GenerateParams) -> DataResult<Vec<CustomerRecord>> {
    if !(0.0..=1.0).contains(&params.churn_rate) {
        return Err(DataError::InvalidParam {
            name: "churn_rate",
            msg: format!("must be in [0, 1], got {}", params.churn_rate),
        });
    }
    if params.age_limit <= 18 {
        return Err(DataError::InvalidParam {
            name: "age_limit",
            msg: format!("must exceed 18, got {}", params.age_limit),
        });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let rows = (0..params.n_samples as u64)
        .map(|i| CustomerRecord {
            customer_id: params.first_id + i,
            age: Some(rng.gen_range(18..params.age_limit)),
            tenure_months: Some(rng.gen_range(0..120)),
            monthly_charges: Some(rng.gen_range(20.0..150.0)),
            total_charges: Some(rng.gen_range(100.0..10_000.0)),
            num_products: Some(rng.gen_range(1..5)),
            has_phone: Some(rng.gen_range(0..=1)),
            has_internet: Some(rng.gen_range(0..=1)),
            contract_type: CONTRACT_TYPES.choose(&mut rng).map(|s| s.to_string()),
            payment_method: PAYMENT_METHODS.choose(&mut rng).map(|s| s.to_string()),
            churn: Some(u8::from(rng.gen_bool(params.churn_rate))),
        })
        .collect();
    Ok(rows)
}

/// Outlier removal plus a batch of new customers.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshParams {
    /// Rows with `age` above this, or with no age, are dropped. New rows are
    /// drawn below it.
    pub max_age: u32,
    pub new_records: usize,
    pub seed: u64,
    pub churn_rate: f64,
}

impl Default for RefreshParams {
    fn default() -> Self {
        Self {
            max_age: 75,
            new_records: 2_000,
            seed: 43,
            churn_rate: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub before: DatasetSummary,
    pub removed: usize,
    pub added: usize,
    pub first_new_id: u64,
    pub after: DatasetSummary,
}

/// Produce the next dataset version from `existing`.
pub fn refresh_dataset(
    existing: Vec<CustomerRecord>,
    params: &RefreshParams,
) -> DataResult<(Vec<CustomerRecord>, RefreshReport)> {
    let before = summarize(&existing);
    let first_new_id = existing
        .iter()
        .map(|r| r.customer_id)
        .max()
        .map_or(1, |m| m + 1);

    let initial = existing.len();
    let mut rows: Vec<CustomerRecord> = existing
        .into_iter()
        .filter(|r| r.age.is_some_and(|a| a <= params.max_age))
        .collect();
    let removed = initial - rows.len();

    let fresh = generate_customers(&GenerateParams {
        n_samples: params.new_records,
        seed: params.seed,
        churn_rate: params.churn_rate,
        first_id: first_new_id,
        age_limit: params.max_age,
    })?;
    let added = fresh.len();
    rows.extend(fresh);

    let report = RefreshReport {
        before,
        removed,
        added,
        first_new_id,
        after: summarize(&rows),
    };
    info!(
        removed,
        added,
        records = report.after.records,
        "dataset refreshed"
    );
    Ok((rows, report))
}
