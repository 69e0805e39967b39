// src/source/html.rs
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::error::{PageWatchError, PageWatchResult};
use crate::utils::HttpClient;

use super::SnapshotSource;

/// Fetches pages over HTTP and cuts out the selected element
#[derive(Clone)]
pub struct HttpSnapshotSource {
    client: HttpClient,
}

impl HttpSnapshotSource {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> PageWatchResult<Self> {
        Ok(Self::new(HttpClient::from_config(config)?))
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, address: &str, selector: &str) -> PageWatchResult<String> {
        let url = Url::parse(address).map_err(|e| PageWatchError::Fetch {
            address: address.to_string(),
            message: format!("Invalid address: {}", e),
        })?;

        let (status, body) = self.client.get_page(&url).await.map_err(|e| PageWatchError::Fetch {
            address: address.to_string(),
            message: format!("{:#}", e),
        })?;

        if !status.is_success() {
            return Err(PageWatchError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        extract(address, &body, selector)
    }
}

/// Inner HTML of the first element matching `selector`.
///
/// A selector that matches nothing yields empty content.
pub fn extract(address: &str, html: &str, selector: &str) -> PageWatchResult<String> {
    let parsed = Selector::parse(selector).map_err(|e| PageWatchError::Extraction {
        address: address.to_string(),
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    match document.select(&parsed).next() {
        Some(element) => Ok(element.inner_html()),
        None => {
            debug!("Selector {} matched nothing on {}", selector, address);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Shop</title></head>
<body><div id="stock"><p>sold out</p></div><div class="price">10</div><div class="price">12</div></body></html>"#;

    #[test]
    fn test_extract_first_match() {
        assert_eq!(extract("shop", PAGE, "#stock").unwrap(), "<p>sold out</p>");
        assert_eq!(extract("shop", PAGE, ".price").unwrap(), "10");
    }

    #[test]
    fn test_extract_no_match_is_empty() {
        assert_eq!(extract("shop", PAGE, "#missing").unwrap(), "");
    }

    #[test]
    fn test_extract_invalid_selector() {
        let err = extract("shop", PAGE, "div[").unwrap_err();

        assert!(err.is_fetch_error());
        assert!(matches!(err, PageWatchError::Extraction { ref selector, .. } if selector == "div["));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_address() {
        let source = HttpSnapshotSource::from_config(&HttpConfig::default()).unwrap();

        let err = source.fetch("not a url", "body").await.unwrap_err();
        assert!(matches!(err, PageWatchError::Fetch { .. }));
    }
}
