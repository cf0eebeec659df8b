//! Storage module for persisting announcements
//!
//! This module handles the append-only output of the poller:
//! - Creating the CSV file with its header on first use
//! - Appending new rows durably, in page order
//! - Keeping the watermark next to the file so a restart can pick it up

mod csv_store;
mod traits;

pub use csv_store::{CsvStore, HEADER};
pub use traits::Store;

use crate::StorageResult;
use std::path::Path;

/// Opens the store at `path`, creating it with a header if needed
///
/// # Arguments
///
/// * `path` - Path to the CSV file
///
/// # Returns
///
/// * `Ok(CsvStore)` - Store ready for appends
/// * `Err(StorageError)` - The file could not be created or is not a store
pub fn open_store(path: &Path) -> StorageResult<CsvStore> {
    let mut store = CsvStore::new(path);
    store.ensure_exists()?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let store = open_store(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.location(), path.display().to_string());
    }
}
