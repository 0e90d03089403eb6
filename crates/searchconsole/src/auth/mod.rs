//! Authentication
//!
//! Resolves a [`CredentialSource`] into an authorized [`Account`]. Secrets
//! are zeroized on drop and redacted from `Debug` output.
//!
//! ```no_run
//! # async fn run() -> searchconsole::Result<()> {
//! use searchconsole::{authenticate, CredentialSource, Settings};
//!
//! let account = authenticate(
//!     CredentialSource::File("auth/credentials.json".into()),
//!     &Settings::default(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod flow;
pub mod provider;
mod token;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::account::Account;
use crate::common::http::create_http_client;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::google::SearchConsoleApi;
use crate::transport::TransportError;

pub use credentials::{AuthorizedUser, ClientSecrets, ServiceAccountKey};
pub use token::{Authorizer, Grant};

/// Read-only access to Search Console data.
pub const WEBMASTERS_SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("client secrets must contain an \"installed\" or \"web\" section")]
    MissingClientSection,

    #[error("HTTP request to token endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{error}: {description}")]
    TokenEndpoint { error: String, description: String },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("access token expired and no refresh token is available")]
    NoRefreshToken,

    #[error("failed to sign service account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("callback server error: {0}")]
    Callback(#[source] std::io::Error),

    #[error("authorization flow failed: {0}")]
    Flow(String),

    #[error("state parameter mismatch")]
    StateMismatch,

    #[error("OAuth flow timed out after {0} seconds")]
    Timeout(u64),

    #[error("service account credentials cannot be serialized")]
    NotSerializable,
}

/// Where OAuth client secrets or a service-account key come from.
#[derive(Debug, Clone)]
pub enum Source<T> {
    File(PathBuf),
    Inline(T),
}

impl Source<ClientSecrets> {
    fn load(self) -> std::result::Result<ClientSecrets, AuthError> {
        match self {
            Source::File(path) => ClientSecrets::from_file(path),
            Source::Inline(secrets) => Ok(secrets),
        }
    }
}

impl Source<ServiceAccountKey> {
    fn load(self) -> std::result::Result<ServiceAccountKey, AuthError> {
        match self {
            Source::File(path) => ServiceAccountKey::from_file(path),
            Source::Inline(key) => Ok(key),
        }
    }
}

/// How the user grants consent in an interactive flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    /// Browser redirect to a loopback server.
    #[default]
    LocalServer,
    /// Paste the redirect URL into the terminal.
    Console,
}

impl FromStr for Flow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "web" | "local" | "local-server" => Ok(Flow::LocalServer),
            "console" => Ok(Flow::Console),
            other => Err(Error::invalid_argument("flow", other, "one of: web, console")),
        }
    }
}

/// Where credentials come from. The caller picks the variant explicitly.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Serialized authorized-user credentials on disk.
    File(PathBuf),
    /// Authorized-user credentials already in memory.
    Inline(AuthorizedUser),
    /// Run an installed-app consent flow with the given client secrets.
    Interactive {
        client_secrets: Source<ClientSecrets>,
        flow: Flow,
    },
    /// Non-interactive service-account key.
    ServiceAccount(Source<ServiceAccountKey>),
}

impl CredentialSource {
    /// Resolve into a token grant, running the consent flow if needed.
    pub async fn into_grant(
        self,
        http: &reqwest::Client,
        settings: &Settings,
    ) -> std::result::Result<Grant, AuthError> {
        let scopes = [WEBMASTERS_SCOPE];
        let grant = match self {
            CredentialSource::File(path) => Grant::User(AuthorizedUser::from_file(path)?),
            CredentialSource::Inline(user) => Grant::User(user),
            CredentialSource::Interactive {
                client_secrets,
                flow: kind,
            } => {
                let secrets = client_secrets.load()?;
                let user = match kind {
                    Flow::LocalServer => {
                        flow::run_local_server(http, &secrets, &scopes, settings.callback_timeout_secs)
                            .await?
                    }
                    Flow::Console => flow::run_console(http, &secrets, &scopes).await?,
                };
                Grant::User(user)
            }
            CredentialSource::ServiceAccount(source) => Grant::service_account(source.load()?),
        };
        Ok(grant)
    }
}

/// Authenticate and load the account's web properties.
pub async fn authenticate(source: CredentialSource, settings: &Settings) -> Result<Account> {
    let http = create_http_client(settings).map_err(TransportError::from)?;
    let grant = source.into_grant(&http, settings).await?;

    let authorizer = Arc::new(Authorizer::new(http.clone(), grant));
    info!("Authenticated as {}", authorizer.identity());

    let api = SearchConsoleApi::new(http, &settings.api_base_url, authorizer.clone());
    Account::connect(Arc::new(api), Some(authorizer), settings.pacing()).await
}
