//! Poller module for watching the announcements page
//!
//! This module contains the polling pipeline, including:
//! - HTTP fetching of the listing page
//! - HTML extraction of announcement entries
//! - Pacing with backoff and a parse failure alarm
//! - The loop controller that persists new entries and moves the watermark

mod alarm;
mod backoff;
mod controller;
mod extractor;
mod fetcher;

pub use alarm::ParseAlarm;
pub use backoff::Backoff;
pub use controller::{Controller, CycleOutcome};
pub use extractor::{
    Extractor, CONTAINER_SELECTOR, ENTRY_SELECTOR, LABEL_SELECTOR, PINNED_SELECTOR,
};
pub use fetcher::{build_http_client, Fetcher};

use crate::config::Config;
use crate::storage::open_store;
use crate::WatchError;
use tokio_util::sync::CancellationToken;

/// Watches the configured page until `shutdown` is cancelled
///
/// This is the main entry point for a long-running poller. It will:
/// 1. Open (or create) the CSV store
/// 2. Optionally restore the watermark saved by the previous run
/// 3. Poll, dedup and append until cancelled
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `resume` - Seed the watermark saved by the previous run
/// * `shutdown` - Token that stops the loop
///
/// # Returns
///
/// * `Ok(())` - The loop was cancelled
/// * `Err(WatchError)` - Startup failed (bad store file, client setup)
///
/// # Example
///
/// ```no_run
/// use bulletin_watch::config::{resolve_config, Overrides};
/// use bulletin_watch::poller::watch;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, _) = resolve_config(None, Overrides::default())?;
/// watch(config, false, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn watch(
    config: Config,
    resume: bool,
    shutdown: CancellationToken,
) -> Result<(), WatchError> {
    let store = open_store(&config.output.path)?;
    let mut controller = Controller::new(&config, store)?;
    controller.prepare(resume)?;
    controller.run(shutdown).await;
    Ok(())
}
