//! Poll loop controller
//!
//! This module contains the loop that ties the pipeline together:
//! - Ensuring the store exists (and optionally recovering the watermark)
//! - Fetching, extracting and deduplicating one listing page per cycle
//! - Persisting new entries before advancing the watermark
//! - Pacing cycles with backoff and honoring shutdown

use crate::config::{Config, PageTarget};
use crate::dedup::{new_items, Watermark};
use crate::poller::alarm::ParseAlarm;
use crate::poller::backoff::Backoff;
use crate::poller::extractor::Extractor;
use crate::poller::fetcher::Fetcher;
use crate::record::AnnouncementRecord;
use crate::storage::Store;
use crate::WatchError;
use tokio_util::sync::CancellationToken;

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New entries were fetched and appended
    Appended { count: usize, watermark: Watermark },

    /// Entries left over from a failed persist were appended; nothing was fetched
    Recovered { count: usize, watermark: Watermark },

    /// The page held nothing newer than the watermark
    NoNewItems,
}

/// Drives fetch -> extract -> dedup -> persist cycles against one store
pub struct Controller<S: Store> {
    fetcher: Fetcher,
    extractor: Extractor,
    store: S,
    target: PageTarget,
    watermark: Watermark,
    pending: Vec<AnnouncementRecord>,
    backoff: Backoff,
    alarm: ParseAlarm,
}

impl<S: Store> Controller<S> {
    /// Creates a controller instance
    ///
    /// Nothing is fetched or written until `prepare` or a cycle runs.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `store` - Append-only store the entries go to
    pub fn new(config: &Config, store: S) -> Result<Self, WatchError> {
        let fetcher = Fetcher::new(&config.source)?;
        let extractor = Extractor::new(fetcher.base_url().clone())?;

        Ok(Self {
            fetcher,
            extractor,
            store,
            target: config.target.clone(),
            watermark: Watermark::empty(),
            pending: Vec::new(),
            backoff: Backoff::from_config(&config.poll),
            alarm: ParseAlarm::new(config.poll.parse_alert_threshold),
        })
    }

    /// Creates the store if needed and sets the starting watermark
    ///
    /// With `resume`, the watermark saved by the previous run is restored,
    /// so a restart against an unchanged page appends nothing. Otherwise it
    /// starts empty and the first poll re-appends the whole page.
    pub fn prepare(&mut self, resume: bool) -> Result<(), WatchError> {
        self.store.ensure_exists()?;

        if resume {
            match self.store.load_watermark()? {
                Some(fingerprint) => {
                    self.watermark = Watermark::from_fingerprint(fingerprint);
                    tracing::info!(
                        watermark = %self.watermark,
                        "Recovered watermark for {}",
                        self.store.location()
                    );
                }
                None => {
                    tracing::info!("No saved watermark, starting with an empty watermark");
                }
            }
        }

        Ok(())
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// Entries fetched but not yet persisted
    pub fn pending(&self) -> &[AnnouncementRecord] {
        &self.pending
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetcher used for every cycle; changes apply from the next fetch
    pub fn fetcher_mut(&mut self) -> &mut Fetcher {
        &mut self.fetcher
    }

    pub fn parse_alarm(&self) -> &ParseAlarm {
        &self.alarm
    }

    /// Consecutive failed cycles since the last success
    pub fn consecutive_failures(&self) -> u32 {
        self.backoff.failures()
    }

    /// Runs one polling cycle
    ///
    /// If a previous persist failed, this retries only that persist and does
    /// not fetch. The watermark moves only after a successful append.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, WatchError> {
        if !self.pending.is_empty() {
            let count = self.persist_pending()?;
            tracing::info!(
                count,
                watermark = %self.watermark,
                "Appended {} held-back announcements to {}",
                count,
                self.store.location()
            );
            return Ok(CycleOutcome::Recovered {
                count,
                watermark: self.watermark.clone(),
            });
        }

        let body = self.fetcher.fetch(&self.target).await?;

        let records = match self.extractor.extract(&body) {
            Ok(records) => {
                self.alarm.reset();
                records
            }
            Err(e) => {
                if self.alarm.record_failure() {
                    tracing::error!(
                        alert = true,
                        consecutive = self.alarm.consecutive(),
                        "Listing page failed to parse {} times in a row; \
                         the page layout may have changed",
                        self.alarm.consecutive()
                    );
                }
                return Err(e.into());
            }
        };

        let fresh = new_items(&records, &self.watermark);
        if fresh.is_empty() {
            tracing::debug!(watermark = %self.watermark, "No new announcements");
            return Ok(CycleOutcome::NoNewItems);
        }

        self.pending = fresh.to_vec();
        let count = self.persist_pending()?;

        tracing::info!(
            count,
            watermark = %self.watermark,
            "Appended {} new announcements to {}",
            count,
            self.store.location()
        );

        Ok(CycleOutcome::Appended {
            count,
            watermark: self.watermark.clone(),
        })
    }

    /// Appends the pending entries, then advances the watermark to the newest
    ///
    /// Failing to save the watermark does not undo the append; the in-memory
    /// watermark still moves so the next cycle does not write the rows twice.
    fn persist_pending(&mut self) -> Result<usize, WatchError> {
        self.store.append(&self.pending)?;

        if let Some(newest) = self.pending.first() {
            self.watermark.advance_to(&newest.title);
        }
        if let Some(fingerprint) = self.watermark.fingerprint() {
            if let Err(e) = self.store.save_watermark(fingerprint) {
                tracing::warn!("Could not save watermark, a restart may repeat rows: {}", e);
            }
        }

        let count = self.pending.len();
        self.pending.clear();
        Ok(count)
    }

    /// Runs cycles until `shutdown` is cancelled
    ///
    /// Cycle failures are logged and retried after the backoff delay; they
    /// never end the loop. Cancellation is honored while a fetch is in
    /// flight and during the idle wait.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            category = %self.target.category,
            page = self.target.page,
            "Polling {} into {}",
            self.fetcher.page_url(&self.target),
            self.store.location()
        );

        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.run_cycle() => outcome,
            };

            match outcome {
                Ok(_) => self.backoff.reset(),
                Err(e) => {
                    self.backoff.record_failure();
                    self.log_failure(&e);
                }
            }

            let delay = self.backoff.delay();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if !self.pending.is_empty() {
            tracing::warn!(
                pending = self.pending.len(),
                "Stopping with announcements that were never persisted"
            );
        }
        tracing::info!(watermark = %self.watermark, "Poll loop stopped");
    }

    fn log_failure(&self, error: &WatchError) {
        let stage = error.stage();
        let failures = self.backoff.failures();
        let retry_ms = self.backoff.base_delay().as_millis() as u64;

        match error {
            WatchError::Fetch(e) => {
                tracing::warn!(stage, failures, retry_ms, "Fetch failed: {}", e);
            }
            WatchError::Parse(e) => {
                tracing::error!(stage, failures, retry_ms, "Parse failed: {}", e);
            }
            WatchError::Storage(e) => {
                tracing::error!(
                    stage,
                    failures,
                    retry_ms,
                    pending = self.pending.len(),
                    "Persist failed, holding entries for retry: {}",
                    e
                );
            }
            WatchError::Config(e) => {
                tracing::error!(stage, failures, retry_ms, "Configuration error: {}", e);
            }
        }
    }
}
