//! Storage trait
//!
//! This module defines the interface the poll loop uses to persist
//! announcements.

use crate::dedup::Fingerprint;
use crate::record::AnnouncementRecord;
use crate::StorageResult;

/// Append-only record store
///
/// Implementations never update or delete rows. `append` must not return
/// until the rows are durable on the underlying medium.
pub trait Store {
    /// Human-readable location of the store, used in logs
    fn location(&self) -> String;

    /// Creates the store with its header if it does not exist yet
    fn ensure_exists(&mut self) -> StorageResult<()>;

    /// Appends records in the order given
    ///
    /// Creates the store first if it is missing. On error nothing from
    /// this batch may remain, since the caller retries the whole batch.
    fn append(&mut self, records: &[AnnouncementRecord]) -> StorageResult<()>;

    /// Remembers the fingerprint of the newest persisted record
    ///
    /// Called after a successful `append`. A crash between the two leaves
    /// the previous fingerprint behind, so the last batch may be written
    /// twice but never lost.
    fn save_watermark(&mut self, fingerprint: &Fingerprint) -> StorageResult<()>;

    /// Fingerprint saved by the last `save_watermark`, if any
    fn load_watermark(&self) -> StorageResult<Option<Fingerprint>>;

    /// Number of data rows (the header is not counted)
    fn count_records(&self) -> StorageResult<u64>;
}
