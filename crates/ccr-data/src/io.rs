use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::record::{CustomerRecord, ProcessedRecord};

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> DataResult<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| match e.kind() {
        csv::ErrorKind::Io(_) => DataError::Io(format!("open '{}': {e}", path.display())),
        _ => DataError::from(e),
    })?;
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    debug!(path = %path.display(), rows = rows.len(), "csv read");
    Ok(rows)
}

/// Write rows with a header, creating parent directories.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> DataResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DataError::Io(format!("create_dir_all '{}': {e}", parent.display())))?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()
        .map_err(|e| DataError::Io(format!("flush '{}': {e}", path.display())))?;
    debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}

pub fn read_customers(path: &Path) -> DataResult<Vec<CustomerRecord>> {
    read_csv(path)
}

pub fn write_customers(path: &Path, rows: &[CustomerRecord]) -> DataResult<()> {
    write_csv(path, rows)
}

pub fn read_processed(path: &Path) -> DataResult<Vec<ProcessedRecord>> {
    read_csv(path)
}

pub fn write_processed(path: &Path, rows: &[ProcessedRecord]) -> DataResult<()> {
    write_csv(path, rows)
}
