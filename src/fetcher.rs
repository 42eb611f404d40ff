//! Fetching archive pages over HTTP.
//!
//! The pipeline talks to the network through the [`PageSource`] trait so the
//! downloaders can be driven by in-memory sources in tests. The production
//! source, [`HttpPageSource`], owns the single `reqwest::Client` shared by
//! every downloader. The client keeps its own connection pool and is
//! released when the source is dropped, which the pipeline does exactly once
//! after all workers have stopped.

use crate::models::{Job, RawPage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Archive listing for the China top-news topic.
pub const ARCHIVE_URL: &str = "https://cn.reuters.com/news/archive/topic-cn-top-news";

/// Stories per archive page.
pub const PAGE_SIZE: usize = 10;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/80.0.3987.163 Safari/537.36";

const HEADERS: [(&str, &str); 5] = [
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "cross-site"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
];

/// Produces one [`RawPage`] per [`Job`].
///
/// Implementations must not fail: a page that cannot be fetched comes back
/// with absent content.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, job: &Job) -> RawPage;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
}

/// HTTP source backed by one pooled client.
#[derive(Debug)]
pub struct HttpPageSource {
    client: Client,
    base_url: Url,
    page_size: usize,
}

impl HttpPageSource {
    /// Build the shared client with the fixed browser headers.
    pub fn new(base_url: &str, page_size: usize, timeout: Duration) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        for (name, value) in HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(%base_url, page_size, ?timeout, "HTTP client created");
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            page_size,
        })
    }

    /// Listing URL for one page index.
    pub fn page_url(&self, index: usize) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("view", "page")
            .append_pair("page", &index.to_string())
            .append_pair("pageSize", &self.page_size.to_string());
        url
    }

    async fn get_text(&self, url: Url) -> Result<(StatusCode, String), FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok((status, resp.text().await?))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip_all, fields(page = job.index))]
    async fn fetch(&self, job: &Job) -> RawPage {
        let url = self.page_url(job.index);
        let t0 = Instant::now();
        match self.get_text(url).await {
            Ok((status, body)) => {
                info!(
                    status = status.as_u16(),
                    bytes = body.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Fetched page"
                );
                RawPage::fetched(job.index, body)
            }
            Err(FetchError::Status(status)) => {
                warn!(
                    status = status.as_u16(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Page fetch returned non-success status"
                );
                RawPage::failed(job.index)
            }
            Err(e) => {
                error!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Page fetch failed");
                RawPage::failed(job.index)
            }
        }
    }
}

impl Drop for HttpPageSource {
    fn drop(&mut self) {
        info!("HTTP client released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> HttpPageSource {
        let base = format!("{}/news/archive", server.uri());
        HttpPageSource::new(&base, PAGE_SIZE, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_page_url_carries_index_and_size() {
        let source = HttpPageSource::new(ARCHIVE_URL, PAGE_SIZE, Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.page_url(3).as_str(),
            "https://cn.reuters.com/news/archive/topic-cn-top-news?view=page&page=3&pageSize=10"
        );
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/archive"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "10"))
            .and(header("upgrade-insecure-requests", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>page two</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let page = source(&server).fetch(&Job { index: 2 }).await;
        assert_eq!(page.index, 2);
        assert_eq!(page.content.as_deref(), Some("<html>page two</html>"));
    }

    #[tokio::test]
    async fn test_error_status_gives_absent_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let page = source(&server).fetch(&Job { index: 0 }).await;
        assert!(page.is_failed());
    }

    #[tokio::test]
    async fn test_timeout_gives_absent_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let base = format!("{}/news/archive", server.uri());
        let source = HttpPageSource::new(&base, PAGE_SIZE, Duration::from_millis(50)).unwrap();
        let page = source.fetch(&Job { index: 1 }).await;
        assert!(page.is_failed());
    }

    #[tokio::test]
    async fn test_connection_refused_gives_absent_content() {
        let source = HttpPageSource::new("http://127.0.0.1:9/archive", PAGE_SIZE, Duration::from_secs(1)).unwrap();
        let page = source.fetch(&Job { index: 4 }).await;
        assert_eq!(page.index, 4);
        assert!(page.is_failed());
    }
}
