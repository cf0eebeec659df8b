//! HTTP fetcher implementation
//!
//! This module handles the single request each poll cycle makes:
//! - Building the HTTP client with the identification header and timeouts
//! - Building the listing URL for a category and page
//! - Classifying failures (timeout, connection, status) for the poll loop

use crate::config::{PageTarget, SourceConfig};
use crate::{ConfigError, FetchError, FetchResult};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches listing pages from the announcements site
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
    listing_url: Url,
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header sent with every request
/// * `timeout` - Whole-request timeout
/// * `connect_timeout` - Connection establishment timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

impl Fetcher {
    /// Creates a fetcher for the configured source
    ///
    /// # Example
    ///
    /// ```
    /// use bulletin_watch::config::{PageTarget, SourceConfig};
    /// use bulletin_watch::poller::Fetcher;
    ///
    /// let fetcher = Fetcher::new(&SourceConfig::default()).unwrap();
    /// let url = fetcher.page_url(&PageTarget::default());
    /// assert_eq!(url.as_str(), "https://announcements.bybit.com/en-US/?category=&page=1");
    /// ```
    pub fn new(config: &SourceConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let listing_url = base_url
            .join(&format!("{}/", config.locale))
            .map_err(|e| ConfigError::InvalidUrl(format!("locale '{}': {}", config.locale, e)))?;

        let client = build_http_client(
            &config.user_agent,
            config.timeout(),
            config.connect_timeout(),
        )?;

        Ok(Self {
            client,
            base_url,
            listing_url,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
        })
    }

    /// Site root that entry links are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Replaces the User-Agent header for all subsequent requests
    ///
    /// The HTTP client is rebuilt; on failure the previous client and
    /// header stay in effect.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> Result<(), ConfigError> {
        let user_agent = user_agent.into();
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty".to_string(),
            ));
        }

        self.client = build_http_client(&user_agent, self.timeout, self.connect_timeout)?;
        tracing::debug!("User-Agent changed to {}", user_agent);
        self.user_agent = user_agent;
        Ok(())
    }

    /// URL of the listing page for a category and page number
    pub fn page_url(&self, target: &PageTarget) -> Url {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .append_pair("category", &target.category)
            .append_pair("page", &target.page.to_string());
        url
    }

    /// Fetches the raw HTML of a listing page
    ///
    /// Any non-2xx status is an error; the caller decides whether to retry.
    pub async fn fetch(&self, target: &PageTarget) -> FetchResult<String> {
        let url = self.page_url(target);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_error(url.as_str(), e))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            source: error,
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(base_url: &str) -> SourceConfig {
        SourceConfig {
            base_url: base_url.to_string(),
            user_agent: "TestAgent/1.0".to_string(),
            timeout_secs: 2,
            connect_timeout_secs: 1,
            ..SourceConfig::default()
        }
    }

    fn target(category: &str, page: u32) -> PageTarget {
        PageTarget {
            category: category.to_string(),
            page,
        }
    }

    #[test]
    fn test_page_url() {
        let fetcher = Fetcher::new(&source_for("https://announcements.example.com")).unwrap();

        assert_eq!(
            fetcher.page_url(&target("", 1)).as_str(),
            "https://announcements.example.com/en-US/?category=&page=1"
        );
        assert_eq!(
            fetcher.page_url(&target("new_crypto", 3)).as_str(),
            "https://announcements.example.com/en-US/?category=new_crypto&page=3"
        );
    }

    #[test]
    fn test_page_url_with_locale() {
        let mut source = source_for("https://announcements.example.com");
        source.locale = "zh-TW".to_string();
        let fetcher = Fetcher::new(&source).unwrap();

        assert_eq!(
            fetcher.page_url(&target("", 2)).as_str(),
            "https://announcements.example.com/zh-TW/?category=&page=2"
        );
    }

    #[test]
    fn test_set_user_agent_rejects_empty() {
        let mut fetcher = Fetcher::new(&source_for("https://example.com")).unwrap();
        assert!(fetcher.set_user_agent("  ").is_err());
        assert_eq!(fetcher.user_agent(), "TestAgent/1.0");
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en-US/"))
            .and(query_param("category", "new_crypto"))
            .and(query_param("page", "2"))
            .and(header("user-agent", "TestAgent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&source_for(&server.uri())).unwrap();
        let body = fetcher.fetch(&target("new_crypto", 2)).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_set_user_agent_applies_to_next_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Changed/2.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("changed"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("original"))
            .mount(&server)
            .await;

        let mut fetcher = Fetcher::new(&source_for(&server.uri())).unwrap();
        assert_eq!(fetcher.fetch(&target("", 1)).await.unwrap(), "original");

        fetcher.set_user_agent("Changed/2.0").unwrap();
        assert_eq!(fetcher.user_agent(), "Changed/2.0");
        assert_eq!(fetcher.fetch(&target("", 1)).await.unwrap(), "changed");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&source_for(&server.uri())).unwrap();
        let err = fetcher.fetch(&target("", 1)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut source = source_for(&server.uri());
        source.timeout_secs = 1;
        let fetcher = Fetcher::new(&source).unwrap();

        let err = fetcher.fetch(&target("", 1)).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 1 of the loopback interface
        let fetcher = Fetcher::new(&source_for("http://127.0.0.1:1")).unwrap();
        let err = fetcher.fetch(&target("", 1)).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }));
    }
}
