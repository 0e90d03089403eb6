//! Credential Files
//!
//! Serialized authorized-user credentials, OAuth client secrets and
//! service-account keys. All three use the JSON layouts Google tooling
//! writes, so files produced elsewhere load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::provider::{AUTH_ENDPOINT, TOKEN_ENDPOINT};
use super::AuthError;

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_auth_uri() -> String {
    AUTH_ENDPOINT.to_string()
}

fn read(path: &Path) -> Result<String, AuthError> {
    fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: for<'de> Deserialize<'de>>(text: &str, origin: &str) -> Result<T, AuthError> {
    serde_json::from_str(text).map_err(|source| AuthError::Parse {
        origin: origin.to_string(),
        source,
    })
}

// ── Authorized user ─────────────────────────────────────────────────────────

/// OAuth2 user credentials (decrypted form).
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_token_uri")]
    #[zeroize(skip)]
    pub token_uri: String,
    #[zeroize(skip)]
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[zeroize(skip)]
    pub expiry: Option<DateTime<Utc>>,
}

impl fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AuthorizedUser {
    pub fn from_json(text: &str) -> Result<Self, AuthError> {
        parse(text, "authorized user credentials")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        debug!("Loading credentials from {:?}", path);
        parse(&read(path)?, &path.display().to_string())
    }

    /// Write the credentials as JSON, readable only by the current user.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AuthError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| AuthError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| AuthError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(io_err)?;

        // `mode` only applies to new files; tighten an existing one before
        // any secret is written to it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
        file.write_all(json.as_bytes()).map_err(io_err)?;

        info!("Credentials saved to {:?}", path);
        Ok(())
    }
}

// ── Client secrets ──────────────────────────────────────────────────────────

/// OAuth client registration, the inner object of a `client_secrets.json`.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ClientSecrets {
    #[zeroize(skip)]
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    #[zeroize(skip)]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    #[zeroize(skip)]
    pub token_uri: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub redirect_uris: Vec<String>,
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ClientSecrets {
    /// Parse either the wrapped download format (`{"installed": {...}}` or
    /// `{"web": {...}}`) or a bare client object.
    pub fn from_json(text: &str) -> Result<Self, AuthError> {
        Self::from_value(parse(text, "client secrets")?)
    }

    pub fn from_value(mut value: serde_json::Value) -> Result<Self, AuthError> {
        let section = ["installed", "web"]
            .into_iter()
            .find(|k| value.get(*k).is_some());
        let inner = match section {
            Some(key) => value[key].take(),
            None if value.get("client_id").is_some() => value,
            None => return Err(AuthError::MissingClientSection),
        };
        serde_json::from_value(inner).map_err(|source| AuthError::Parse {
            origin: "client secrets".to_string(),
            source,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        Self::from_value(parse(&read(path)?, &path.display().to_string())?)
    }
}

// ── Service account ─────────────────────────────────────────────────────────

/// Service-account key file as downloaded from the cloud console.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    #[zeroize(skip)]
    pub key_type: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub project_id: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    #[zeroize(skip)]
    pub client_email: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    #[zeroize(skip)]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[REDACTED]")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(text: &str) -> Result<Self, AuthError> {
        parse(text, "service account key")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        parse(&read(path)?, &path.display().to_string())
    }
}
