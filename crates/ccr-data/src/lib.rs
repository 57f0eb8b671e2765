//! Customer dataset handling: synthetic generation, version refresh,
//! preprocessing, summaries and the train/test split.

mod error;
mod generate;
mod io;
mod preprocess;
mod record;
mod split;
mod summary;

pub use error::{DataError, DataResult};
pub use generate::{
    generate_customers, refresh_dataset, GenerateParams, RefreshParams, RefreshReport,
};
pub use io::{read_csv, read_customers, read_processed, write_csv, write_customers, write_processed};
pub use preprocess::{median, preprocess, PreprocessReport, DERIVED_COLUMNS};
pub use record::{
    CustomerRecord, ProcessedRecord, CONTRACT_TYPES, NUMERIC_COLUMNS, PAYMENT_METHODS,
    STRING_COLUMNS,
};
pub use split::{train_test_split, Split};
pub use summary::{
    compare_datasets, fingerprint_file, summarize, summarize_csv, summarize_path,
    DatasetComparison, DatasetSummary,
};
