use serde::{Deserialize, Serialize};

pub const CONTRACT_TYPES: [&str; 3] = ["month", "year", "two_year"];
pub const PAYMENT_METHODS: [&str; 4] = ["credit", "debit", "bank", "mail"];

/// One row of the raw customer table.
///
/// Every column except `customer_id` may be blank in a raw file; blanks
/// decode to `None` and are imputed by preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: u64,
    pub age: Option<u32>,
    pub tenure_months: Option<u32>,
    pub monthly_charges: Option<f64>,
    pub total_charges: Option<f64>,
    pub num_products: Option<u32>,
    pub has_phone: Option<u8>,
    pub has_internet: Option<u8>,
    pub contract_type: Option<String>,
    pub payment_method: Option<String>,
    pub churn: Option<u8>,
}

/// Numeric feature columns of the raw table, in file order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "age",
    "tenure_months",
    "monthly_charges",
    "total_charges",
    "num_products",
    "has_phone",
    "has_internet",
    "churn",
];

/// Text columns dropped by preprocessing.
pub const STRING_COLUMNS: [&str; 2] = ["contract_type", "payment_method"];

impl CustomerRecord {
    pub(crate) fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "age" => self.age.map(f64::from),
            "tenure_months" => self.tenure_months.map(f64::from),
            "monthly_charges" => self.monthly_charges,
            "total_charges" => self.total_charges,
            "num_products" => self.num_products.map(f64::from),
            "has_phone" => self.has_phone.map(f64::from),
            "has_internet" => self.has_internet.map(f64::from),
            "churn" => self.churn.map(f64::from),
            _ => None,
        }
    }
}

/// Model-ready row: numeric only, no gaps, derived features appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub customer_id: u64,
    pub age: f64,
    pub tenure_months: f64,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub num_products: f64,
    pub has_phone: f64,
    pub has_internet: f64,
    /// Imputed labels can be fractional (median of a balanced 0/1 column).
    pub churn: f64,
    /// `total_charges / (tenure_months + 1)`
    pub avg_monthly_charge: f64,
    /// `monthly_charges * tenure_months`
    pub estimated_lifetime_value: f64,
    /// `num_products / (tenure_months + 1)`
    pub products_per_tenure_month: f64,
}

impl ProcessedRecord {
    /// Binary label, rounding imputed values.
    pub fn label(&self) -> u8 {
        u8::from(self.churn >= 0.5)
    }
}
