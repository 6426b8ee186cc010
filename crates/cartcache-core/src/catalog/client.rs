//! HTTP client for the remote item catalog.
//!
//! The catalog backend serves every orderable item in one response. This
//! client fetches it and nothing else; order submission and analytics live
//! elsewhere.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CatalogError, CatalogSource};
use crate::models::CatalogItem;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// The backend has served both a bare array and a wrapped object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    Bare(Vec<CatalogItem>),
    Wrapped { items: Vec<CatalogItem> },
}

impl CatalogResponse {
    fn into_items(self) -> Vec<CatalogItem> {
        match self {
            CatalogResponse::Bare(items) => items,
            CatalogResponse::Wrapped { items } => items,
        }
    }
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url.trim_end_matches('/'))
    }

    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::from_status(status, &body).into())
        }
    }

    /// Fetch every item in the catalog
    pub async fn fetch_items(&self) -> Result<Vec<CatalogItem>> {
        let url = self.items_url();
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| {
                    warn!(url = %url, error = %e, "Catalog request failed");
                    CatalogError::NetworkError(e)
                })?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response from {}", url))?;
                    let items = parse_catalog(&body)?;
                    debug!(url = %url, count = items.len(), "Fetched catalog");
                    return Ok(items);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(CatalogError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }
}

impl CatalogSource for CatalogClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        self.fetch_items().await
    }
}

fn parse_catalog(body: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    serde_json::from_str::<CatalogResponse>(body)
        .map(CatalogResponse::into_items)
        .map_err(|e| CatalogError::InvalidResponse(format!("Unrecognized catalog payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_url() {
        let client = CatalogClient::new("https://catalog.example.com/api/").unwrap();
        assert_eq!(client.items_url(), "https://catalog.example.com/api/items");

        let client = CatalogClient::new("https://catalog.example.com").unwrap();
        assert_eq!(client.items_url(), "https://catalog.example.com/items");
    }

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"id": "i1", "name": "Burger", "cost": 5.0},
                       {"id": "i2", "name": "Fries", "cost": 2.5, "timesOrdered": 4}]"#;
        let items = parse_catalog(json).expect("Failed to parse bare catalog");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].times_ordered, 4);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let json = r#"{"items": [{"id": "i1", "name": "Burger"}]}"#;
        let items = parse_catalog(json).expect("Failed to parse wrapped catalog");
        assert_eq!(items[0].name, "Burger");
    }

    #[tokio::test]
    async fn test_send_failure_is_network_error() {
        // Relative URLs fail inside reqwest before any connection is made
        let client = CatalogClient::new("not-a-url").unwrap();
        let err = client.fetch_items().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::NetworkError(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_catalog(r#"{"foods": []}"#),
            Err(CatalogError::InvalidResponse(_))
        ));
    }
}
