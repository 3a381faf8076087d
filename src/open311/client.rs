// ABOUTME: HTTP client for the Open311 GeoReport requests endpoint
// ABOUTME: Fetches one page of service requests updated after a watermark

use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::RequestSource;
use crate::error::{EtlError, Result};
use crate::record::Record;
use crate::socrata::client::ensure_success;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

pub struct Open311Client {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Open311Client {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// URL of one page of requests updated after `updated_after`, oldest first.
    pub fn page_url(&self, updated_after: &str, page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/requests.json", self.base_url))
            .map_err(|e| EtlError::InvalidInput(format!("Invalid Open311 base URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("order", "updated_datetime")
            .append_pair("updated_after", updated_after)
            .append_pair("per_page", &PAGE_SIZE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

impl RequestSource for Open311Client {
    async fn fetch_page(&self, updated_after: &str, page: u32) -> Result<Vec<Record>> {
        let url = self.page_url(updated_after, page)?;
        tracing::debug!("Requesting page {} from {}", page, url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let response = ensure_success(url.as_str(), response).await?;
        Ok(response.json::<Vec<Record>>().await?)
    }
}
