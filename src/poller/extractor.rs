//! HTML extractor for announcement listings
//!
//! Turns a listing page into records in page order (newest first), skipping
//! entries the site pins above the chronological list.

use crate::record::{now_truncated, AnnouncementRecord};
use crate::{ParseError, ParseResult};
use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Block that wraps the list of entries
pub const CONTAINER_SELECTOR: &str = "div.article-list";

/// One anchor per announcement
pub const ENTRY_SELECTOR: &str = "a.no-style";

/// Marker present inside pinned entries
pub const PINNED_SELECTOR: &str = "div.article-item-tag-top";

/// Element holding the entry's title text
pub const LABEL_SELECTOR: &str = "span";

/// Extracts announcement records from listing pages
#[derive(Debug, Clone)]
pub struct Extractor {
    base_url: Url,
    container: Selector,
    entry: Selector,
    pinned: Selector,
    label: Selector,
}

fn compile(selector: &'static str) -> ParseResult<Selector> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector,
        reason: e.to_string(),
    })
}

impl Extractor {
    /// Creates an extractor resolving entry links against `base_url`
    pub fn new(base_url: Url) -> ParseResult<Self> {
        Ok(Self {
            base_url,
            container: compile(CONTAINER_SELECTOR)?,
            entry: compile(ENTRY_SELECTOR)?,
            pinned: compile(PINNED_SELECTOR)?,
            label: compile(LABEL_SELECTOR)?,
        })
    }

    /// Extracts records stamped with the current time
    pub fn extract(&self, html: &str) -> ParseResult<Vec<AnnouncementRecord>> {
        self.extract_at(html, now_truncated())
    }

    /// Extracts records stamped with `observed_at`
    ///
    /// # Errors
    ///
    /// * `MissingContainer` - the page has no listing block (layout change,
    ///   error page, block page)
    /// * `NoEntries` - the listing block holds no entry anchors
    /// * `MalformedEntry` - an unpinned entry has no title or link
    ///
    /// A listing whose entries are all pinned yields an empty vector.
    pub fn extract_at(
        &self,
        html: &str,
        observed_at: NaiveDateTime,
    ) -> ParseResult<Vec<AnnouncementRecord>> {
        let document = Html::parse_document(html);

        let container = document
            .select(&self.container)
            .next()
            .ok_or(ParseError::MissingContainer {
                selector: CONTAINER_SELECTOR,
            })?;

        let entries: Vec<ElementRef> = container.select(&self.entry).collect();
        if entries.is_empty() {
            return Err(ParseError::NoEntries {
                selector: ENTRY_SELECTOR,
            });
        }

        let mut records = Vec::with_capacity(entries.len());
        let mut pinned = 0;

        for (index, entry) in entries.iter().enumerate() {
            if self.is_pinned(entry) {
                pinned += 1;
                continue;
            }
            records.push(self.build_record(index, entry, observed_at)?);
        }

        tracing::debug!(
            entries = entries.len(),
            pinned,
            extracted = records.len(),
            "Parsed listing page"
        );

        Ok(records)
    }

    fn is_pinned(&self, entry: &ElementRef) -> bool {
        entry.select(&self.pinned).next().is_some()
    }

    fn build_record(
        &self,
        index: usize,
        entry: &ElementRef,
        observed_at: NaiveDateTime,
    ) -> ParseResult<AnnouncementRecord> {
        let title = entry
            .select(&self.label)
            .next()
            .map(|label| label.text().collect::<String>().trim().to_string())
            .ok_or_else(|| ParseError::MalformedEntry {
                index,
                reason: format!("no <{}> label", LABEL_SELECTOR),
            })?;

        if title.is_empty() {
            return Err(ParseError::MalformedEntry {
                index,
                reason: "empty title".to_string(),
            });
        }

        let href = entry
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| ParseError::MalformedEntry {
                index,
                reason: "missing href".to_string(),
            })?;

        let link = self
            .base_url
            .join(href)
            .map_err(|e| ParseError::MalformedEntry {
                index,
                reason: format!("bad href '{}': {}", href, e),
            })?;

        Ok(AnnouncementRecord::new(title, link.to_string(), observed_at))
    }
}
