//! Remote item sources for widgets.

use std::time::Duration;

use async_trait::async_trait;
use map_common::{MapError, MapResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::picker::MenuItem;

/// Provides the available items of a widget given the values of the
/// widgets it depends on.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch the item list for `query` (an encoded dependency query string).
    async fn fetch_items(&self, query: &str) -> MapResult<Vec<MenuItem>>;
}

/// Response body of a data accessor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Data accessor reached over HTTP. The query string is appended to the
/// base URL verbatim.
pub struct HttpItemSource {
    client: Client,
    base_url: String,
}

impl HttpItemSource {
    pub fn new(base_url: impl Into<String>) -> MapResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> MapResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MapError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_url(&self, query: &str) -> String {
        format!("{}{}", self.base_url, query)
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_items(&self, query: &str) -> MapResult<Vec<MenuItem>> {
        let url = self.request_url(query);
        debug!(url = %url, "Fetching widget items");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MapError::Retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Data accessor returned an error");
            return Err(MapError::Retrieval(status.to_string()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MapError::Retrieval(e.to_string()))?;
        let parsed: ItemsResponse =
            serde_json::from_slice(&body).map_err(|e| MapError::Retrieval(e.to_string()))?;

        debug!(count = parsed.items.len(), "Fetched widget items");
        Ok(parsed.items)
    }
}

/// Fixed in-memory source, handy for offline configurations.
#[derive(Debug, Clone, Default)]
pub struct StaticItemSource {
    items: Vec<MenuItem>,
}

impl StaticItemSource {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for StaticItemSource {
    async fn fetch_items(&self, _query: &str) -> MapResult<Vec<MenuItem>> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_appends_query() {
        let source = HttpItemSource::new("http://localhost/accessor?").unwrap();
        assert_eq!(
            source.request_url("product=terra"),
            "http://localhost/accessor?product=terra"
        );
    }

    #[test]
    fn test_items_response_parsing() {
        let body = r#"{"items": [
            {"label": "Terra", "value": "terra"},
            {"label": "Aqua", "value": "aqua", "disabled": true}
        ]}"#;
        let parsed: ItemsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert!(!parsed.items[0].disabled);
        assert!(parsed.items[1].disabled);

        let empty: ItemsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_accessor_is_retrieval_error() {
        let source =
            HttpItemSource::with_timeout("http://127.0.0.1:9/items?", Duration::from_secs(2))
                .unwrap();
        let err = source.fetch_items("a=b").await.unwrap_err();
        assert!(err.is_retrieval());
    }

    #[test]
    fn test_static_source() {
        let source = StaticItemSource::new(vec![MenuItem::new("Terra", "terra")]);
        let items = tokio_test::block_on(source.fetch_items("")).unwrap();
        assert_eq!(items[0].value, "terra");
    }
}
