//! Accounts and Web Properties
//!
//! An [`Account`] is the directory of Search Console properties visible to
//! one identity. Select a [`WebProperty`] by position or exact URL and start
//! queries from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::{AuthError, Authorizer};
use crate::error::Result;
use crate::query::{Query, DEFAULT_PACING};
use crate::transport::{SiteEntry, Transport};

/// The user's access level on a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionLevel {
    SiteOwner,
    SiteFullUser,
    SiteRestrictedUser,
    SiteUnverifiedUser,
    #[serde(other)]
    Unknown,
}

impl PermissionLevel {
    /// Sort rank, lowest first: full user, owner, restricted, unverified.
    pub fn rank(&self) -> u8 {
        match self {
            PermissionLevel::SiteFullUser => 1,
            PermissionLevel::SiteOwner => 2,
            PermissionLevel::SiteRestrictedUser => 3,
            PermissionLevel::SiteUnverifiedUser => 4,
            PermissionLevel::Unknown => u8::MAX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::SiteOwner => "siteOwner",
            PermissionLevel::SiteFullUser => "siteFullUser",
            PermissionLevel::SiteRestrictedUser => "siteRestrictedUser",
            PermissionLevel::SiteUnverifiedUser => "siteUnverifiedUser",
            PermissionLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A site tracked in Search Console.
#[derive(Clone)]
pub struct WebProperty {
    url: String,
    permission: PermissionLevel,
    transport: Arc<dyn Transport>,
    pacing: Duration,
}

impl WebProperty {
    fn new(entry: SiteEntry, transport: Arc<dyn Transport>, pacing: Duration) -> Self {
        Self {
            url: entry.site_url,
            permission: entry.permission_level,
            transport,
            pacing,
        }
    }

    /// Exact property URI, e.g. `https://www.example.com/` or
    /// `sc-domain:example.com`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn permission(&self) -> PermissionLevel {
        self.permission
    }

    /// A fresh query bound to this property.
    pub fn query(&self) -> Query {
        Query::new(self.transport.clone(), self.url.clone()).with_pacing(self.pacing)
    }
}

impl PartialEq for WebProperty {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.permission == other.permission
    }
}

impl fmt::Debug for WebProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebProperty")
            .field("url", &self.url)
            .field("permission", &self.permission)
            .finish()
    }
}

pub struct Account {
    transport: Arc<dyn Transport>,
    authorizer: Option<Arc<Authorizer>>,
    properties: Vec<WebProperty>,
    pacing: Duration,
}

impl Account {
    /// Fetch the site list through `transport`.
    pub async fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::connect(transport, None, DEFAULT_PACING).await
    }

    pub(crate) async fn connect(
        transport: Arc<dyn Transport>,
        authorizer: Option<Arc<Authorizer>>,
        pacing: Duration,
    ) -> Result<Self> {
        let mut account = Self {
            transport,
            authorizer,
            properties: Vec::new(),
            pacing,
        };
        account.refresh().await?;
        Ok(account)
    }

    /// Wait between paged requests for queries started from this account.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        for property in &mut self.properties {
            property.pacing = pacing;
        }
        self
    }

    /// Properties in the order the remote service lists them.
    pub fn webproperties(&self) -> &[WebProperty] {
        &self.properties
    }

    /// Property with exactly this URL.
    pub fn get(&self, url: &str) -> Option<&WebProperty> {
        self.properties.iter().find(|p| p.url == url)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WebProperty> {
        self.properties.iter()
    }

    /// OAuth client id or service-account email, when authenticated
    /// through this crate.
    pub fn identity(&self) -> Option<&str> {
        self.authorizer.as_deref().map(Authorizer::identity)
    }

    /// Re-read the site list.
    pub async fn refresh(&mut self) -> Result<()> {
        let sites = self.transport.list_sites().await?;
        info!("Account has {} web properties", sites.len());
        self.properties = sites
            .into_iter()
            .map(|entry| WebProperty::new(entry, self.transport.clone(), self.pacing))
            .collect();
        Ok(())
    }

    /// Write the current user credentials (including a refreshed token) so a
    /// later run can skip the consent flow.
    pub async fn serialize_credentials(&self, path: impl AsRef<Path>) -> Result<()> {
        let authorizer = self.authorizer.as_ref().ok_or(AuthError::NotSerializable)?;
        let user = authorizer
            .authorized_user()
            .await
            .ok_or(AuthError::NotSerializable)?;
        debug!("Serializing credentials for {}", user.client_id);
        user.save(path)?;
        Ok(())
    }
}

impl Index<usize> for Account {
    type Output = WebProperty;

    fn index(&self, index: usize) -> &WebProperty {
        &self.properties[index]
    }
}

impl<'a> IntoIterator for &'a Account {
    type Item = &'a WebProperty;
    type IntoIter = std::slice::Iter<'a, WebProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("identity", &self.identity())
            .field("properties", &self.properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizedUser, Grant};
    use crate::error::Error;
    use crate::testing::{raw_row, FakeTransport};

    fn entry(url: &str, permission: PermissionLevel) -> SiteEntry {
        SiteEntry {
            site_url: url.to_string(),
            permission_level: permission,
        }
    }

    fn sites() -> Vec<SiteEntry> {
        vec![
            entry("https://www.example.com/", PermissionLevel::SiteOwner),
            entry("sc-domain:example.org", PermissionLevel::SiteFullUser),
        ]
    }

    #[tokio::test]
    async fn test_properties_by_index_and_url() {
        let transport = FakeTransport::new().with_sites(sites());
        let account = Account::new(transport.clone()).await.unwrap();

        assert_eq!(account.len(), 2);
        assert_eq!(account[0].url(), "https://www.example.com/");
        assert_eq!(
            account.get("sc-domain:example.org").map(WebProperty::permission),
            Some(PermissionLevel::SiteFullUser)
        );
        assert!(account.get("https://www.example.com").is_none());
        assert_eq!(account.identity(), None);
        assert_eq!(transport.site_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_account() {
        let account = Account::new(FakeTransport::new()).await.unwrap();
        assert!(account.is_empty());
        assert!(account.webproperties().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rereads_sites() {
        let transport = FakeTransport::new().with_sites(sites());
        let mut account = Account::new(transport.clone()).await.unwrap();

        transport.set_sites(vec![entry("https://new.example.com/", PermissionLevel::SiteRestrictedUser)]);
        account.refresh().await.unwrap();

        assert_eq!(account.len(), 1);
        assert_eq!(account[0].permission().rank(), 3);
        assert_eq!(transport.site_calls(), 2);
    }

    #[tokio::test]
    async fn test_property_query_targets_its_url() {
        let transport = FakeTransport::new()
            .with_sites(sites())
            .with_page(vec![raw_row(&["2024-01-01"], 5.0, 50.0, 0.1, Some(2.5))]);
        let account = Account::new(transport.clone())
            .await
            .unwrap()
            .with_pacing(Duration::ZERO);

        let report = account[1]
            .query()
            .range("2024-01-01", "2024-01-01")
            .unwrap()
            .dimension("date")
            .unwrap()
            .get()
            .await
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(transport.requests()[0].0, "sc-domain:example.org");
    }

    #[test]
    fn test_permission_rank_and_wire_names() {
        let mut levels = vec![
            PermissionLevel::SiteUnverifiedUser,
            PermissionLevel::SiteOwner,
            PermissionLevel::SiteRestrictedUser,
            PermissionLevel::SiteFullUser,
        ];
        levels.sort_by_key(PermissionLevel::rank);
        assert_eq!(levels[0], PermissionLevel::SiteFullUser);
        assert_eq!(levels[1], PermissionLevel::SiteOwner);

        let unknown: PermissionLevel = serde_json::from_str("\"siteSomethingNew\"").unwrap();
        assert_eq!(unknown, PermissionLevel::Unknown);
        assert_eq!(PermissionLevel::SiteOwner.to_string(), "siteOwner");
    }

    #[tokio::test]
    async fn test_serialize_credentials() {
        let user = AuthorizedUser::from_json(
            r#"{"token": "t", "refresh_token": "r", "client_id": "c", "client_secret": "s"}"#,
        )
        .unwrap();
        let authorizer = Arc::new(Authorizer::new(reqwest::Client::new(), Grant::User(user.clone())));
        let account = Account::connect(FakeTransport::new(), Some(authorizer), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(account.identity(), Some("c"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        account.serialize_credentials(&path).await.unwrap();
        assert_eq!(AuthorizedUser::from_file(&path).unwrap(), user);
    }

    #[tokio::test]
    async fn test_serialize_without_user_credentials_fails() {
        let account = Account::new(FakeTransport::new()).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = account
            .serialize_credentials(dir.path().join("c.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NotSerializable)));
    }
}
