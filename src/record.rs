//! Announcement record definitions
//!
//! One row of the output file: what was announced, where it lives, and when
//! this process first saw it.

use chrono::{Local, NaiveDateTime, Timelike};
use std::fmt;

/// Format used for the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single announcement scraped from the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementRecord {
    /// Text of the entry's label; also the identity key for dedup
    pub title: String,

    /// Absolute URL of the announcement
    pub link: String,

    /// Wall-clock time of extraction (not a timestamp from the page)
    pub observed_at: NaiveDateTime,
}

impl AnnouncementRecord {
    /// Creates a record observed at the given time
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        observed_at: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            observed_at,
        }
    }

    /// Creates a record stamped with the current local time
    pub fn observed_now(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self::new(title, link, now_truncated())
    }

    /// Returns the `date` column value (`YYYY-MM-DD HH:MM:SS`)
    pub fn date_string(&self) -> String {
        self.observed_at.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for AnnouncementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.link)
    }
}

/// Current local time with sub-second precision dropped, matching the file format
pub fn now_truncated() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
