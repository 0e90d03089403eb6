//! Transport boundary
//!
//! The query builder and account model only see this trait. The HTTP
//! implementation lives in [`crate::google`]; tests plug in an in-memory
//! fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::PermissionLevel;
use crate::auth::AuthError;
use crate::query::QueryRequest;

/// Failures from the network and auth layer. Remote API errors keep the
/// HTTP status and the untouched response body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("failed to decode response: {source} (body: {body})")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
}

impl TransportError {
    /// HTTP status of a remote API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Api { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// One entry of `sites.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    pub permission_level: PermissionLevel,
}

/// A result row as the remote service returns it. `keys` follow the order
/// of the requested dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default, alias = "dimensionValues")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
}

/// Response body of `searchAnalytics.query`. An empty result has no `rows`
/// key at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<RawRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_aggregation_type: Option<String>,
}

/// Authenticated access to the Search Console API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sites the authenticated identity can see.
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, TransportError>;

    /// Run one search analytics request against `site_url`.
    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, TransportError>;
}
