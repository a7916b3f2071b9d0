use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::time::timeout;
use tracing::{debug, error, info};
use url::Url;

use super::errors::{CrlError, CrlResult};
use super::parser::parse_crl;
use super::types::ParsedCrl;

pub const USER_AGENT: &str = concat!("revocheck/", env!("CARGO_PKG_VERSION"));

/// Transport seam for CRL downloads so tests can script responses.
#[async_trait]
pub trait CrlFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> CrlResult<Vec<u8>>;
}

/// HTTP fetcher with a configurable timeout and a fixed User-Agent.
pub struct HttpCrlFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpCrlFetcher {
    /// Returns an error if the HTTP client cannot be initialized
    pub fn new(request_timeout: Duration) -> CrlResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            request_timeout,
        })
    }
}

#[async_trait]
impl CrlFetch for HttpCrlFetcher {
    async fn fetch(&self, url: &str) -> CrlResult<Vec<u8>> {
        let parsed = Url::parse(url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CrlError::Custom(format!(
                "unsupported CRL URL scheme: {url}"
            )));
        }

        debug!("Fetching CRL from: {}", url);

        let response = match timeout(self.request_timeout, self.client.get(url).send()).await {
            Ok(result) => result?,
            Err(_) => return Err(CrlError::Timeout),
        };

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CrlError::NotFound(url.to_string()));
        }
        if !response.status().is_success() {
            return Err(CrlError::Custom(format!(
                "HTTP error {}: failed to fetch CRL from {}",
                response.status(),
                url
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Fetch and parse a CRL from a distribution point URL.
pub async fn fetch_and_parse(fetcher: &dyn CrlFetch, url: &str) -> CrlResult<ParsedCrl> {
    let bytes = fetcher.fetch(url).await?;
    let crl = parse_crl(&bytes, Some(url.to_string()))?;

    info!(
        "Fetched CRL from {} (number {}, {} entries)",
        url,
        crl.crl_number,
        crl.entries.len()
    );
    Ok(crl)
}

/// Fetch and parse CRLs from multiple URLs in parallel using tokio tasks.
/// Every URL yields a result; task failures are logged and skipped.
pub async fn fetch_all(
    fetcher: Arc<dyn CrlFetch>,
    urls: &[String],
) -> Vec<(String, CrlResult<ParsedCrl>)> {
    use tokio::task::JoinSet;

    let mut join_set = JoinSet::new();

    for url in urls {
        let url = url.clone();
        let fetcher = Arc::clone(&fetcher);

        join_set.spawn(async move {
            let result = fetch_and_parse(fetcher.as_ref(), &url).await;
            (url, result)
        });
    }

    let mut results = Vec::with_capacity(urls.len());

    while let Some(task_result) = join_set.join_next().await {
        match task_result {
            Ok(fetch_result) => results.push(fetch_result),
            Err(e) => {
                // Task panicked or was cancelled - this shouldn't happen in normal operation
                error!("CRL fetch task failed to complete: {}", e);
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl CrlFetch for StaticFetcher {
        async fn fetch(&self, _url: &str) -> CrlResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_fetch_and_parse_rejects_garbage() {
        let fetcher = StaticFetcher(vec![0x00, 0x01]);
        let result = fetch_and_parse(&fetcher, "http://crl.example.com/ca.crl").await;
        assert!(matches!(result, Err(CrlError::Parse(_))));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_file_scheme() {
        let fetcher = HttpCrlFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch("file:///etc/passwd").await;
        assert!(matches!(result, Err(CrlError::Custom(_))));
    }

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl CrlFetch for MapFetcher {
        async fn fetch(&self, url: &str) -> CrlResult<Vec<u8>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| CrlError::NotFound(url.to_string()))
        }
    }

    #[tokio::test]
    async fn test_fetch_all_pairs_results_with_urls() {
        let mut responses = HashMap::new();
        responses.insert(
            "http://crl.example.com/a.crl".to_string(),
            vec![0x00, 0x01],
        );
        let fetcher: Arc<dyn CrlFetch> = Arc::new(MapFetcher(responses));

        let urls = vec![
            "http://crl.example.com/a.crl".to_string(),
            "http://crl.example.com/missing.crl".to_string(),
        ];
        let mut results = fetch_all(fetcher, &urls).await;
        assert_eq!(results.len(), 2);

        results.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(results[0].0, "http://crl.example.com/a.crl");
        assert!(matches!(results[0].1, Err(CrlError::Parse(_))));
        assert_eq!(results[1].0, "http://crl.example.com/missing.crl");
        assert!(matches!(results[1].1, Err(CrlError::NotFound(_))));
    }
}
