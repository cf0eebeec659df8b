//! Dedup module
//!
//! Splits a freshly extracted page into the part that is new since the last
//! persisted entry. Pages are newest-first, so the new part is always a
//! prefix.

mod fingerprint;

pub use fingerprint::{Fingerprint, Watermark};

use crate::record::AnnouncementRecord;

/// Returns the entries newer than the watermark
///
/// Scans from the oldest entry (the end of the slice) toward the newest.
/// The first entry whose title matches the watermark ends the scan and
/// everything before it is returned in page order. If nothing matches,
/// the whole page is new.
///
/// # Example
///
/// ```
/// use bulletin_watch::{new_items, AnnouncementRecord, Watermark};
///
/// let page: Vec<_> = ["D", "A", "B"]
///     .iter()
///     .map(|t| AnnouncementRecord::observed_now(*t, format!("https://example.com/{t}")))
///     .collect();
///
/// let fresh = new_items(&page, &Watermark::at_title("A"));
/// assert_eq!(fresh.len(), 1);
/// assert_eq!(fresh[0].title, "D");
/// ```
pub fn new_items<'a>(
    records: &'a [AnnouncementRecord],
    watermark: &Watermark,
) -> &'a [AnnouncementRecord] {
    match records.iter().rposition(|r| watermark.matches(&r.title)) {
        Some(k) => &records[..k],
        None => records,
    }
}
