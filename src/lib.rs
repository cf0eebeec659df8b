//! Bulletin-Watch: an announcement board tail
//!
//! This crate polls a public announcements page, extracts newly published
//! entries, and appends them to an append-only CSV file. A watermark
//! (fingerprint of the newest persisted title) keeps each poll from
//! re-appending what an earlier poll already wrote.

pub mod config;
pub mod dedup;
pub mod poller;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Bulletin-Watch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Persist error: {0}")]
    Storage(#[from] StorageError),
}

impl WatchError {
    /// Name of the pipeline stage that produced this error, for log context
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "persist",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid category '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidCategory(String),

    #[error("Invalid output file: {0}")]
    InvalidOutput(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors raised while requesting the announcements page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },
}

/// Errors raised when the fetched page does not have the expected layout
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Announcement container '{selector}' not found")]
    MissingContainer { selector: &'static str },

    #[error("No announcement entries '{selector}' inside the container")]
    NoEntries { selector: &'static str },

    #[error("Entry #{index} is malformed: {reason}")]
    MalformedEntry { index: usize, reason: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        selector: &'static str,
        reason: String,
    },
}

/// Errors raised by the append-only store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Store {path} has an unexpected header: {found}")]
    BadHeader { path: String, found: String },
}

/// Result type alias for Bulletin-Watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// Re-export commonly used types
pub use config::Config;
pub use dedup::{new_items, Fingerprint, Watermark};
pub use poller::{Controller, CycleOutcome, Fetcher};
pub use record::AnnouncementRecord;
pub use storage::{CsvStore, Store};
