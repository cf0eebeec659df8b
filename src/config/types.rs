use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Browser-like identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/116.0.5845.888 YaBrowser/23.9.2.888 Yowser/2.5 Safari/537.36";

/// Main configuration structure for Bulletin-Watch
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub poll: PollConfig,
    pub output: OutputConfig,
    #[serde(skip)]
    pub target: PageTarget,
}

/// Where announcements are fetched from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Scheme and host of the announcements site; entry links are relative to it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Locale path segment (e.g. "en-US")
    pub locale: String,

    /// Value of the User-Agent header
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://announcements.bybit.com".to_string(),
            locale: "en-US".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Pacing of the poll loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Idle wait between successful cycles (milliseconds)
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Upper bound on the idle wait after repeated failures (milliseconds)
    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,

    /// Random extra wait as a fraction of the backoff delay (0.0 - 1.0)
    pub jitter: f64,

    /// Consecutive parse failures that raise a layout-change alert
    #[serde(rename = "parse-alert-threshold")]
    pub parse_alert_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_backoff_ms: 60_000,
            jitter: 0.2,
            parse_alert_threshold: 5,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV file
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("news.csv"),
        }
    }
}

/// Category and page of the board to watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// Category filter; empty means all categories
    pub category: String,

    /// 1-based page number
    pub page: u32,
}

impl Default for PageTarget {
    fn default() -> Self {
        Self {
            category: String::new(),
            page: 1,
        }
    }
}
