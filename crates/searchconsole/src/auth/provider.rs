//! Google OAuth2 Endpoints
//!
//! Authorization URL construction, code exchange, refresh-token grant and the
//! service-account JWT bearer grant, plus the PKCE helpers the interactive
//! flows need.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::{error, info};

use super::credentials::{ClientSecrets, ServiceAccountKey};
use super::AuthError;

// ── Google OAuth endpoints ──────────────────────────────────────────────────

pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime of a service-account assertion; Google rejects anything longer.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Assumed token lifetime when `expires_in` is missing or out of range.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Tokens returned from a token exchange or refresh.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expiry: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// Build the authorization URL for the PKCE flow.
pub fn authorize_url(
    secrets: &ClientSecrets,
    scopes: &[&str],
    state: &str,
    code_challenge: &str,
    redirect_uri: &str,
) -> String {
    let scope_str = scopes.join(" ");
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
        secrets.auth_uri,
        urlencoding::encode(&secrets.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope_str),
        urlencoding::encode(state),
        urlencoding::encode(code_challenge),
    )
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    code: &str,
    code_verifier: &str,
    redirect_uri: &str,
) -> Result<OAuthTokens, AuthError> {
    info!("Exchanging authorization code for tokens");

    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("code_verifier", code_verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];

    let body = post_form(http, &secrets.token_uri, &params).await?;
    parse_token_response(&body)
}

/// Refresh an access token using a refresh token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    token_uri: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OAuthTokens, AuthError> {
    info!("Refreshing access token");

    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let body = post_form(http, token_uri, &params).await?;
    parse_token_response(&body)
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Sign the RS256 assertion a service account trades for an access token.
pub(crate) fn service_account_assertion(
    key: &ServiceAccountKey,
    scopes: &[&str],
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: scopes.join(" "),
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &signing_key)?)
}

/// Trade a signed service-account assertion for an access token.
pub async fn jwt_bearer_grant(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
    scopes: &[&str],
) -> Result<OAuthTokens, AuthError> {
    info!("Requesting access token for {}", key.client_email);

    let assertion = service_account_assertion(key, scopes, Utc::now())?;
    let params = [
        ("grant_type", JWT_BEARER_GRANT),
        ("assertion", assertion.as_str()),
    ];

    let body = post_form(http, &key.token_uri, &params).await?;
    parse_token_response(&body)
}

// ── HTTP utilities ──────────────────────────────────────────────────────────

/// POST a form-encoded request and return the response body.
///
/// Secrets travel in the request body only.
async fn post_form(
    http: &reqwest::Client,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, AuthError> {
    let response = http.post(url).form(params).send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Error bodies carry {"error", "error_description"} when the grant is rejected.
        if let Err(e) = parse_token_response(&body) {
            if matches!(e, AuthError::TokenEndpoint { .. }) {
                error!("Token endpoint rejected request: {}", e);
                return Err(e);
            }
        }
        error!("Token endpoint HTTP error {}", status);
        return Err(AuthError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Parse a Google OAuth2 token response.
pub(crate) fn parse_token_response(body: &str) -> Result<OAuthTokens, AuthError> {
    let parsed: serde_json::Value = serde_json::from_str(body).map_err(|source| AuthError::Parse {
        origin: "token response".to_string(),
        source,
    })?;

    if let Some(err) = parsed.get("error").and_then(|v| v.as_str()) {
        let description = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        return Err(AuthError::TokenEndpoint {
            error: err.to_string(),
            description: description.to_string(),
        });
    }

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::InvalidResponse("missing access_token".to_string()))?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let id_token = parsed
        .get("id_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split(' ').map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        id_token,
        expiry: expiry_after(expires_in),
        scopes,
    })
}

fn expiry_after(expires_in: i64) -> DateTime<Utc> {
    let now = Utc::now();
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS))
}

// ── PKCE Utilities ──────────────────────────────────────────────────────────

/// Generate a PKCE code verifier (43-128 characters of unreserved URI characters).
pub fn generate_code_verifier() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Derive the PKCE code challenge from a code verifier using S256.
pub fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(verifier.as_bytes());
    base64_url_encode(&hash)
}

/// Random state string for CSRF protection.
pub fn generate_state() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::rngs::OsRng.gen();
    hex::encode(bytes)
}

/// Base64url encoding (no padding) per RFC 4648 §5.
fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> ClientSecrets {
        ClientSecrets::from_json(r#"{"installed": {"client_id": "abc.apps", "client_secret": "s"}}"#)
            .unwrap()
    }

    #[test]
    fn test_code_verifier_length() {
        let v = generate_code_verifier();
        assert!(v.len() >= 43);
        assert!(v.len() <= 128);
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_state_is_random_hex() {
        let a = generate_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_state());
    }

    #[test]
    fn test_authorize_url_carries_scope_and_challenge() {
        let url = authorize_url(
            &secrets(),
            &["https://www.googleapis.com/auth/webmasters.readonly"],
            "st",
            "ch",
            "http://127.0.0.1:8080",
        );
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("client_id=abc.apps"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fwebmasters.readonly"));
        assert!(url.contains("code_challenge=ch&code_challenge_method=S256"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080"));
    }

    #[test]
    fn test_parse_token_response_success() {
        let body = r#"{
            "access_token": "ya29.test",
            "refresh_token": "1//0e.test",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/webmasters.readonly"
        }"#;

        let tokens = parse_token_response(body).unwrap();
        assert_eq!(tokens.access_token, "ya29.test");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//0e.test"));
        assert_eq!(tokens.scopes.len(), 1);
        assert!(tokens.expiry > Utc::now());
    }

    #[test]
    fn test_out_of_range_expires_in_falls_back() {
        for expires_in in [i64::MAX, i64::MIN, 9_000_000_000_000_000] {
            let body = format!(r#"{{"access_token": "ya29.test", "expires_in": {expires_in}}}"#);
            let tokens = parse_token_response(&body).unwrap();
            let remaining = tokens.expiry - Utc::now();
            assert!(remaining > Duration::minutes(59));
            assert!(remaining <= Duration::seconds(DEFAULT_EXPIRES_IN_SECS));
        }
    }

    #[test]
    fn test_parse_token_response_error() {
        let body = r#"{"error": "invalid_grant", "error_description": "Token has been revoked"}"#;
        match parse_token_response(body).unwrap_err() {
            AuthError::TokenEndpoint { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description, "Token has been revoked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_private_key_is_rejected() {
        let key = ServiceAccountKey::from_json(
            r#"{"private_key": "not a pem", "client_email": "svc@demo.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        let err = service_account_assertion(&key, &["scope"], Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::Jwt(_)));
    }
}
