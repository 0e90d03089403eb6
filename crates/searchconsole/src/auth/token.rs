//! Access token cache with lazy refresh.

use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::credentials::{AuthorizedUser, ServiceAccountKey};
use super::provider::{jwt_bearer_grant, refresh_access_token, OAuthTokens};
use super::{AuthError, WEBMASTERS_SCOPE};

/// Tokens expiring within this many seconds are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The identity an [`Authorizer`] speaks for.
pub enum Grant {
    User(AuthorizedUser),
    ServiceAccount {
        key: ServiceAccountKey,
        token: Option<String>,
        expiry: Option<DateTime<Utc>>,
    },
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::User(user) => f.debug_tuple("User").field(user).finish(),
            Grant::ServiceAccount { key, expiry, .. } => f
                .debug_struct("ServiceAccount")
                .field("key", key)
                .field("token", &"[REDACTED]")
                .field("expiry", expiry)
                .finish(),
        }
    }
}

impl Grant {
    pub fn service_account(key: ServiceAccountKey) -> Self {
        Grant::ServiceAccount {
            key,
            token: None,
            expiry: None,
        }
    }

    fn identity(&self) -> String {
        match self {
            Grant::User(user) => user.client_id.clone(),
            Grant::ServiceAccount { key, .. } => key.client_email.clone(),
        }
    }

    /// The cached token, if it stays valid for at least `margin_secs`.
    fn valid_token(&self, margin_secs: i64) -> Option<String> {
        let (token, expiry, refreshable) = match self {
            Grant::User(user) => (&user.token, user.expiry, user.refresh_token.is_some()),
            Grant::ServiceAccount { token, expiry, .. } => (token, *expiry, true),
        };
        let token = token.as_ref().filter(|t| !t.is_empty())?;
        let fresh = match expiry {
            Some(expiry) => !is_token_expiring(expiry, margin_secs),
            // Unknown lifetime: trust it only when it cannot be renewed.
            None => !refreshable,
        };
        fresh.then(|| token.clone())
    }
}

/// Hands out bearer tokens for API calls, refreshing them through the token
/// endpoint when missing or about to expire.
pub struct Authorizer {
    http: reqwest::Client,
    identity: String,
    grant: RwLock<Grant>,
}

impl Authorizer {
    pub fn new(http: reqwest::Client, grant: Grant) -> Self {
        Self {
            http,
            identity: grant.identity(),
            grant: RwLock::new(grant),
        }
    }

    /// OAuth client id, or the service account's email address.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// A valid access token, refreshing first if necessary.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.grant.read().await.valid_token(REFRESH_MARGIN_SECS) {
            return Ok(token);
        }

        let mut grant = self.grant.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = grant.valid_token(REFRESH_MARGIN_SECS) {
            return Ok(token);
        }

        if let Err(e) = self.refresh(&mut grant).await {
            // If the token hasn't fully expired yet, use it anyway
            if let Some(token) = grant.valid_token(0) {
                warn!("Token refresh failed but token not yet expired: {}", e);
                return Ok(token);
            }
            return Err(e);
        }

        grant
            .valid_token(0)
            .ok_or_else(|| AuthError::InvalidResponse("token endpoint returned an expired token".to_string()))
    }

    /// Current user credentials; `None` for service accounts.
    pub async fn authorized_user(&self) -> Option<AuthorizedUser> {
        match &*self.grant.read().await {
            Grant::User(user) => Some(user.clone()),
            Grant::ServiceAccount { .. } => None,
        }
    }

    async fn refresh(&self, grant: &mut Grant) -> Result<(), AuthError> {
        match grant {
            Grant::User(user) => {
                let refresh_token = user.refresh_token.clone().ok_or(AuthError::NoRefreshToken)?;
                let tokens = refresh_access_token(
                    &self.http,
                    &user.token_uri,
                    &user.client_id,
                    &user.client_secret,
                    &refresh_token,
                )
                .await?;
                apply_user_tokens(user, tokens);
            }
            Grant::ServiceAccount { key, token, expiry } => {
                let tokens = jwt_bearer_grant(&self.http, key, &[WEBMASTERS_SCOPE]).await?;
                *token = Some(tokens.access_token.clone());
                *expiry = Some(tokens.expiry);
            }
        }
        info!("Access token refreshed for {}", self.identity);
        Ok(())
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

fn apply_user_tokens(user: &mut AuthorizedUser, tokens: OAuthTokens) {
    debug!("New access token expires at {}", tokens.expiry);
    user.token = Some(tokens.access_token);
    user.expiry = Some(tokens.expiry);
    // Google only returns a new refresh token when it rotates the old one.
    if let Some(refresh) = tokens.refresh_token {
        user.refresh_token = Some(refresh);
    }
    if tokens.id_token.is_some() {
        user.id_token = tokens.id_token;
    }
    if !tokens.scopes.is_empty() {
        user.scopes = tokens.scopes;
    }
}

/// Check whether a token's expiry is within `margin_secs` of now.
fn is_token_expiring(expiry: DateTime<Utc>, margin_secs: i64) -> bool {
    let remaining = expiry.signed_duration_since(Utc::now()).num_seconds();
    remaining < margin_secs
}
