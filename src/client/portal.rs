//! Portal REST API Client
//!
//! HTTP client for the commercial data portal. Every call is a GET whose
//! body is a JSON array of flat records; bodies go through the lenient
//! parser because the portal emits bare `NaN`.

use async_trait::async_trait;
use reqwest::Client;

use super::{RecordSource, SourceError, SourceResult};
use crate::record::{parse_records, Record, TerritoryMap};

/// Portal client configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Bulk dataset path
    pub records_path: String,
    /// HCP 360 path; `{name}` is replaced with the percent-encoded name
    pub hcp_360_path: String,
    /// HCO 360 path; `{mdm}` is replaced with the percent-encoded id
    pub hco_360_path: String,
    /// ZIP → territory path
    pub territories_path: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            records_path: "/api/records".to_string(),
            hcp_360_path: "/api/hcp360/{name}".to_string(),
            hco_360_path: "/api/hco360/{mdm}".to_string(),
            territories_path: "/api/zip-territories".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Portal REST API client
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Create a new portal client with the given configuration
    pub fn new(config: PortalConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SourceError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Shared HTTP client (reused for boundary downloads)
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for a path template
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn hcp_360_url(&self, name: &str) -> String {
        self.url(
            &self
                .config
                .hcp_360_path
                .replace("{name}", &urlencoding::encode(name.trim())),
        )
    }

    fn hco_360_url(&self, mdm: &str) -> String {
        self.url(
            &self
                .config
                .hco_360_path
                .replace("{mdm}", &urlencoding::encode(mdm.trim())),
        )
    }

    /// GET a URL and return the body text
    async fn get_text(&self, url: &str) -> SourceResult<String> {
        tracing::debug!(url = %url, "Fetching from portal");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SourceError::from_transport)?;

        if response.status().is_success() {
            response.text().await.map_err(SourceError::from_transport)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), "Portal returned an error");
            Err(SourceError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn get_records(&self, url: &str) -> SourceResult<Vec<Record>> {
        let body = self.get_text(url).await?;
        let records = parse_records(&body)?;
        tracing::debug!(url = %url, records = records.len(), "Parsed portal records");
        Ok(records)
    }
}

#[async_trait]
impl RecordSource for PortalClient {
    fn name(&self) -> &str {
        "portal"
    }

    async fn fetch_all(&self) -> SourceResult<Vec<Record>> {
        self.get_records(&self.url(&self.config.records_path)).await
    }

    async fn fetch_hcp_360(&self, name: &str) -> SourceResult<Vec<Record>> {
        self.get_records(&self.hcp_360_url(name)).await
    }

    async fn fetch_hco_360(&self, mdm: &str) -> SourceResult<Vec<Record>> {
        self.get_records(&self.hco_360_url(mdm)).await
    }

    async fn fetch_territories(&self) -> SourceResult<TerritoryMap> {
        let body = self
            .get_text(&self.url(&self.config.territories_path))
            .await?;
        Ok(TerritoryMap::parse(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.records_path, "/api/records");
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_url_building() {
        let client = PortalClient::new(PortalConfig {
            base_url: "https://portal.example.com/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.url("/api/records"),
            "https://portal.example.com/api/records"
        );
        assert_eq!(
            client.hcp_360_url("Jane Doe, MD"),
            "https://portal.example.com/api/hcp360/Jane%20Doe%2C%20MD"
        );
        assert_eq!(
            client.hco_360_url("MDM/42"),
            "https://portal.example.com/api/hco360/MDM%2F42"
        );
    }

    #[tokio::test]
    async fn test_unreachable_portal_is_reported() {
        let client = PortalClient::new(PortalConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 2_000,
            ..Default::default()
        })
        .unwrap();

        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Unavailable | SourceError::Timeout | SourceError::Request(_)
        ));
    }
}
