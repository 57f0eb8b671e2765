use std::fmt;

/// Errors produced by dataset generation, I/O and preprocessing.
#[derive(Debug)]
pub enum DataError {
    /// File system failure.
    Io(String),
    /// CSV decoding or encoding failure, with the 1-based data row when known.
    Csv { row: Option<u64>, msg: String },
    /// A generation or split parameter is out of range.
    InvalidParam { name: &'static str, msg: String },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(msg) => write!(f, "data io error: {msg}"),
            DataError::Csv { row: Some(row), msg } => write!(f, "csv row {row}: {msg}"),
            DataError::Csv { row: None, msg } => write!(f, "csv error: {msg}"),
            DataError::InvalidParam { name, msg } => write!(f, "invalid parameter '{name}': {msg}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        let row = e.position().map(|p| p.record());
        DataError::Csv {
            row,
            msg: e.to_string(),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
