//! Search Console API (webmasters v3)
//!
//! - `GET  {base}/sites`
//! - `POST {base}/sites/{siteUrl}/searchAnalytics/query`

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::client::GoogleClient;
use crate::auth::Authorizer;
use crate::query::QueryRequest;
use crate::transport::{QueryResponse, SiteEntry, Transport, TransportError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SitesListResponse {
    #[serde(default)]
    site_entry: Vec<SiteEntry>,
}

/// HTTP implementation of [`Transport`].
#[derive(Debug, Clone)]
pub struct SearchConsoleApi {
    client: GoogleClient,
    base_url: String,
}

impl SearchConsoleApi {
    pub fn new(http: reqwest::Client, base_url: &str, authorizer: Arc<Authorizer>) -> Self {
        Self {
            client: GoogleClient::new(http, authorizer),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn sites_url(&self) -> String {
        format!("{}/sites", self.base_url)
    }

    /// Site URLs contain `:` and `/`, so the path segment is percent-encoded.
    fn query_url(&self, site_url: &str) -> String {
        format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            urlencoding::encode(site_url)
        )
    }
}

#[async_trait]
impl Transport for SearchConsoleApi {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, TransportError> {
        let response: SitesListResponse = self.client.get(&self.sites_url()).await?;
        debug!("Listed {} sites", response.site_entry.len());
        Ok(response.site_entry)
    }

    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, TransportError> {
        self.client.post(&self.query_url(site_url), request).await
    }
}
