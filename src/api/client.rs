//! HTTP client for the report server.
//!
//! Documents are fetched from the resource API, report scripts and
//! listings through whitelisted RPC methods. The [`ReportTransport`]
//! trait is the seam the viewer talks through, so tests can substitute
//! a canned transport.

use super::error::ApiError;
use super::models::{DoctypeMeta, ReportDocument, ReportListEntry, ReportScript};
use crate::config::ServerConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Server-side operations the report viewer depends on.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Fetch a report document by name. Rejects when the name does not
    /// resolve or the report is disabled.
    async fn get_report_doc(&self, name: &str) -> Result<ReportDocument, ApiError>;

    /// Fetch the report's settings script descriptor.
    async fn get_script(&self, report_name: &str) -> Result<ReportScript, ApiError>;

    /// Fetch the schema of an entity type.
    async fn get_doctype_meta(&self, doctype: &str) -> Result<DoctypeMeta, ApiError>;

    /// Role-filtered listing of reports visible to the current user.
    async fn list_reports(&self) -> Result<Vec<ReportListEntry>, ApiError>;
}

/// Report server client with connection pooling.
#[derive(Clone)]
pub struct ReportClient {
    base_url: String,
    http_client: reqwest::Client,
    auth_header: Option<String>,
}

/// Resource API responses arrive wrapped in `data`.
#[derive(Deserialize)]
struct ResourceResponse<T> {
    data: T,
}

/// Whitelisted method responses arrive wrapped in `message`.
#[derive(Deserialize)]
struct MethodResponse<T> {
    message: T,
}

impl ReportClient {
    pub fn new(config: &ServerConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("reportview-cli/1.0")
            .build()
            .expect("Failed to build HTTP client");

        let auth_header = match (&config.api_key, &config.api_secret) {
            (Some(key), Some(secret)) => Some(format!("token {}:{}", key, secret)),
            _ => None,
        };

        Self {
            base_url: config.host.trim_end_matches('/').to_string(),
            http_client,
            auth_header,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the server event stream consumed by the realtime listener.
    pub fn events_url(&self, channel: &str) -> String {
        format!(
            "{}/api/events?channel={}",
            self.base_url,
            urlencoding::encode(channel)
        )
    }

    fn resource_url(&self, doctype: &str, name: &str) -> String {
        format!(
            "{}/api/resource/{}/{}",
            self.base_url,
            urlencoding::encode(doctype),
            urlencoding::encode(name)
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }

    pub(crate) fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http_client.get(url);
        if let Some(header) = &self.auth_header {
            builder = builder.header("Authorization", header);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        log::debug!("GET {}", url);
        let response = self.request(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ReportTransport for ReportClient {
    async fn get_report_doc(&self, name: &str) -> Result<ReportDocument, ApiError> {
        let url = self.resource_url("Report", name);
        let doc = match self.get_json::<ResourceResponse<ReportDocument>>(&url, &[]).await {
            Ok(wrapper) => wrapper.data,
            Err(ApiError::Http { status: 404, .. }) => {
                return Err(ApiError::ReportNotFound(name.to_string()));
            }
            Err(e) => return Err(e),
        };

        if doc.disabled {
            return Err(ApiError::ReportDisabled(doc.name));
        }

        log::info!("Fetched report document: {}", doc.name);
        Ok(doc)
    }

    async fn get_script(&self, report_name: &str) -> Result<ReportScript, ApiError> {
        let url = self.method_url("reportview.report.get_script");
        self.get_json::<MethodResponse<ReportScript>>(&url, &[("report_name", report_name)])
            .await
            .map(|wrapper| wrapper.message)
            .map_err(|e| ApiError::ScriptFetchFailure {
                report: report_name.to_string(),
                source: e.into(),
            })
    }

    async fn get_doctype_meta(&self, doctype: &str) -> Result<DoctypeMeta, ApiError> {
        let url = self.resource_url("DocType", doctype);
        let meta = self
            .get_json::<ResourceResponse<DoctypeMeta>>(&url, &[])
            .await?
            .data;
        log::debug!("Prefetched schema for doctype: {}", meta.name);
        Ok(meta)
    }

    async fn list_reports(&self) -> Result<Vec<ReportListEntry>, ApiError> {
        let url = self.method_url("reportview.report.get_list");
        Ok(self
            .get_json::<MethodResponse<Vec<ReportListEntry>>>(&url, &[])
            .await?
            .message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(host: &str, key: Option<&str>, secret: Option<&str>) -> ReportClient {
        ReportClient::new(&ServerConfig {
            host: host.to_string(),
            api_key: key.map(str::to_string),
            api_secret: secret.map(str::to_string),
            request_timeout_secs: 5,
        })
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client = client_with("https://desk.example.com/", None, None);
        assert_eq!(client.base_url(), "https://desk.example.com");
    }

    #[test]
    fn test_resource_url_encodes_name() {
        let client = client_with("https://desk.example.com", None, None);
        assert_eq!(
            client.resource_url("Report", "Sales Summary"),
            "https://desk.example.com/api/resource/Report/Sales%20Summary"
        );
    }

    #[test]
    fn test_auth_header_requires_both_parts() {
        let client = client_with("http://localhost:8000", Some("key"), None);
        assert!(client.auth_header.is_none());

        let client = client_with("http://localhost:8000", Some("key"), Some("secret"));
        assert_eq!(client.auth_header.as_deref(), Some("token key:secret"));
    }

    #[test]
    fn test_events_url() {
        let client = client_with("http://localhost:8000", None, None);
        assert_eq!(
            client.events_url("report"),
            "http://localhost:8000/api/events?channel=report"
        );
    }

    #[test]
    fn test_wrapped_responses_deserialize() {
        let wrapper: ResourceResponse<ReportDocument> = serde_json::from_value(serde_json::json!({
            "data": {"name": "X", "ref_doctype": "Item"}
        }))
        .unwrap();
        assert_eq!(wrapper.data.name, "X");

        let wrapper: MethodResponse<ReportScript> = serde_json::from_value(serde_json::json!({
            "message": {"script": "sales_summary", "execution_time": 12}
        }))
        .unwrap();
        assert_eq!(wrapper.message.execution_time, 12);
    }
}
