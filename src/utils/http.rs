// src/utils/http.rs
use std::time::Duration;
use anyhow::{Result, Context};
use reqwest::{Client, StatusCode, header};
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;

/// HTTP client shared by every watched page
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let user_agent = user_agent.unwrap_or_else(|| format!("pagewatch/{}", env!("CARGO_PKG_VERSION")));
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(30));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, user_agent })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(Some(config.user_agent.clone()), Some(config.timeout_seconds))
    }

    /// GET a page and read its body as text. Error statuses come back with an empty body.
    pub async fn get_page(&self, url: &Url) -> Result<(StatusCode, String)> {
        debug!("GET {}", url);

        let response = self.client
            .get(url.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .context(format!("Failed to GET {}", url))?;

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} -> {}, body skipped", url, status);
            return Ok((status, String::new()));
        }

        let body = response
            .text()
            .await
            .context(format!("Failed to read body of {}", url))?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok((status, body))
    }

    /// Get the user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
