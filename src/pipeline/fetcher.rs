//! Document fetcher for caller-supplied URLs

use crate::config::FetcherConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use tracing::debug;

/// Fetches raw text content from a URL
pub struct DocumentFetcher {
    http: Client,
}

impl DocumentFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self { http })
    }

    /// GET the URL and return its body text
    ///
    /// Transport failures and non-2xx statuses both surface as fetch
    /// errors; the caller decides whether to store them as error results.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching document: url={}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{}: status {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/doc.txt")
            .with_status(200)
            .with_body("the document body")
            .create_async()
            .await;

        let fetcher = DocumentFetcher::new(FetcherConfig::default()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/doc.txt", server.url()))
            .await
            .unwrap();

        assert_eq!(body, "the document body");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.txt")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = DocumentFetcher::new(FetcherConfig::default()).unwrap();
        let result = fetcher.fetch(&format!("{}/missing.txt", server.url())).await;

        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let fetcher = DocumentFetcher::new(FetcherConfig::default()).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/doc.txt").await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }
}
