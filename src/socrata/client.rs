// ABOUTME: HTTP client for the Socrata SODA resource API
// ABOUTME: Upserts, replaces and queries hosted datasets with app-token and basic auth

use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;

use super::models::{SoqlQuery, UpsertResult};
use super::DatasetSink;
use crate::config::SocrataConfig;
use crate::error::{EtlError, Result};
use crate::record::Record;

/// Large report uploads can take minutes on the Socrata side.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(500);

pub struct SocrataClient {
    client: Client,
    base_url: String,
    app_token: String,
    username: String,
    password: String,
}

impl SocrataClient {
    pub fn new(config: &SocrataConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: &SocrataConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: normalize_domain(&config.domain),
            app_token: config.app_token.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn resource_url(&self, dataset_id: &str) -> String {
        format!("{}/resource/{}.json", self.base_url, dataset_id)
    }

    /// Insert-or-update `records` by the dataset's row identifier.
    pub async fn upsert(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult> {
        self.publish(Method::POST, dataset_id, records).await
    }

    /// Overwrite the dataset's contents with `records`.
    pub async fn replace(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult> {
        self.publish(Method::PUT, dataset_id, records).await
    }

    async fn publish(
        &self,
        method: Method,
        dataset_id: &str,
        records: &[Record],
    ) -> Result<UpsertResult> {
        let url = self.resource_url(dataset_id);
        tracing::debug!("{} {} records to {}", method, records.len(), url);

        let response = self
            .client
            .request(method, &url)
            .header("X-App-Token", &self.app_token)
            .basic_auth(&self.username, Some(&self.password))
            .json(records)
            .send()
            .await?;

        let response = ensure_success(&url, response).await?;
        Ok(response.json::<UpsertResult>().await?)
    }

    /// Run a SoQL query and return the matching rows.
    pub async fn query(&self, dataset_id: &str, query: &SoqlQuery) -> Result<Vec<Record>> {
        let url = self.resource_url(dataset_id);

        let response = self
            .client
            .get(&url)
            .header("X-App-Token", &self.app_token)
            .basic_auth(&self.username, Some(&self.password))
            .query(&query.to_params())
            .send()
            .await?;

        let response = ensure_success(&url, response).await?;
        Ok(response.json::<Vec<Record>>().await?)
    }
}

impl DatasetSink for SocrataClient {
    async fn upsert(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult> {
        SocrataClient::upsert(self, dataset_id, records).await
    }

    async fn replace(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult> {
        SocrataClient::replace(self, dataset_id, records).await
    }

    async fn latest_value(&self, dataset_id: &str, column: &str) -> Result<Option<String>> {
        let query = SoqlQuery::new()
            .select(column)
            .where_(&format!("{} IS NOT NULL", column))
            .order(&format!("{} DESC", column))
            .limit(1);
        let rows = self.query(dataset_id, &query).await?;
        latest_from_rows(&rows, column)
    }
}

/// The first row's `column` as text. No rows means an empty dataset; a row
/// without a text value is an error rather than a reason to start over.
fn latest_from_rows(rows: &[Record], column: &str) -> Result<Option<String>> {
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    match row.get(column) {
        Some(Value::String(value)) => Ok(Some(value.clone())),
        other => Err(EtlError::InvalidInput(format!(
            "Latest row has no text {} value: {}",
            column,
            other.map(Value::to_string).unwrap_or_else(|| "missing".to_string())
        ))),
    }
}

/// Turn a non-2xx response into an `EtlError::Http` carrying the body.
pub(crate) async fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EtlError::Http {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Accepts `data.example.gov` as well as a full URL.
fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(domain: &str) -> SocrataConfig {
        SocrataConfig {
            domain: domain.to_string(),
            app_token: "token".to_string(),
            username: "key".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = SocrataClient::new(&config("data.example.gov")).unwrap();
        assert_eq!(client.base_url, "https://data.example.gov");
    }

    #[test]
    fn test_resource_url() {
        let client = SocrataClient::new(&config("https://data.example.gov/")).unwrap();
        assert_eq!(
            client.resource_url("abcd-1234"),
            "https://data.example.gov/resource/abcd-1234.json"
        );
    }

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_latest_from_rows_empty_dataset() {
        assert_eq!(latest_from_rows(&[], "updated_datetime").unwrap(), None);
    }

    #[test]
    fn test_latest_from_rows_text_value() {
        let rows = vec![row(serde_json::json!({"updated_datetime": "2025-10-15T08:00:00.000"}))];
        assert_eq!(
            latest_from_rows(&rows, "updated_datetime").unwrap().as_deref(),
            Some("2025-10-15T08:00:00.000")
        );
    }

    #[test]
    fn test_latest_from_rows_missing_value_is_error() {
        let err = latest_from_rows(&[Record::new()], "updated_datetime").unwrap_err();
        assert!(matches!(err, EtlError::InvalidInput(_)));

        let rows = vec![row(serde_json::json!({"updated_datetime": 1760533200}))];
        assert!(latest_from_rows(&rows, "updated_datetime").is_err());
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("data.example.gov"), "https://data.example.gov");
        assert_eq!(normalize_domain("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(
            normalize_domain(" https://data.example.gov "),
            "https://data.example.gov"
        );
    }
}
