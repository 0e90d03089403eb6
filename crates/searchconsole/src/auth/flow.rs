//! Interactive Authorization Flows
//!
//! Installed-app PKCE flow with either a loopback callback server or a
//! console prompt where the user pastes the redirect URL.

use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use super::credentials::{AuthorizedUser, ClientSecrets};
use super::provider::{
    authorize_url, exchange_code, generate_code_challenge, generate_code_verifier,
    generate_state, OAuthTokens,
};
use super::AuthError;

/// Redirect target for the console flow. Nothing listens there; the user
/// copies the address the browser lands on.
pub const CONSOLE_REDIRECT_URI: &str = "http://localhost:8080/";

/// Run the flow with a loopback server on a random port and wait up to
/// `timeout_secs` for the browser callback.
pub async fn run_local_server(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    scopes: &[&str],
    timeout_secs: u64,
) -> Result<AuthorizedUser, AuthError> {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(AuthError::Callback)?;
    let port = listener.local_addr().map_err(AuthError::Callback)?.port();
    let redirect_uri = format!("http://127.0.0.1:{}", port);
    info!("OAuth callback server listening on {}", redirect_uri);

    let auth_url = authorize_url(secrets, scopes, &state, &code_challenge, &redirect_uri);

    info!("Opening browser for OAuth authorization");
    if let Err(e) = open::that(&auth_url) {
        warn!("Failed to open browser automatically: {}", e);
        eprintln!("Please visit this URL to authorize access:\n\n{}\n", auth_url);
    }

    let code = wait_for_callback(&listener, &state, timeout_secs).await?;
    let tokens = exchange_code(http, secrets, &code, &code_verifier, &redirect_uri).await?;

    info!("OAuth flow completed");
    Ok(into_authorized_user(secrets, scopes, tokens))
}

/// Run the flow without a local server: print the URL, read the redirect
/// URL (or the bare code) from stdin.
pub async fn run_console(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    scopes: &[&str],
) -> Result<AuthorizedUser, AuthError> {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    let auth_url = authorize_url(
        secrets,
        scopes,
        &state,
        &code_challenge,
        CONSOLE_REDIRECT_URI,
    );

    eprintln!("Please visit this URL to authorize access:\n\n{}\n", auth_url);
    eprintln!("Then paste the full address of the page you were redirected to:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(AuthError::Callback)?;

    let code = extract_code(&line, &state)?;
    let tokens = exchange_code(http, secrets, &code, &code_verifier, CONSOLE_REDIRECT_URI).await?;

    info!("OAuth flow completed");
    Ok(into_authorized_user(secrets, scopes, tokens))
}

fn into_authorized_user(secrets: &ClientSecrets, scopes: &[&str], tokens: OAuthTokens) -> AuthorizedUser {
    let scopes = if tokens.scopes.is_empty() {
        scopes.iter().map(|s| s.to_string()).collect()
    } else {
        tokens.scopes
    };
    AuthorizedUser {
        token: Some(tokens.access_token),
        refresh_token: tokens.refresh_token,
        id_token: tokens.id_token,
        token_uri: secrets.token_uri.clone(),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes,
        expiry: Some(tokens.expiry),
    }
}

/// Accept connections until one carries the OAuth callback.
async fn wait_for_callback(
    listener: &TcpListener,
    state: &str,
    timeout_secs: u64,
) -> Result<String, AuthError> {
    timeout(Duration::from_secs(timeout_secs), async {
        loop {
            let (mut socket, _) = listener.accept().await.map_err(AuthError::Callback)?;

            let request_line = read_request_head(&mut socket).await?;

            // "GET /path?query HTTP/1.1"
            let Some(target) = request_line.split_whitespace().nth(1) else {
                continue;
            };
            let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
            let params = parse_query_params(query);

            if let (Some(code), Some(received_state)) = (params.get("code"), params.get("state")) {
                if received_state != state {
                    let html = callback_html("Error: Invalid state parameter. Please try again.");
                    send_response(&mut socket, "400 Bad Request", html).await?;
                    return Err(AuthError::StateMismatch);
                }

                let html = callback_html("Authentication successful! You can close this tab.");
                send_response(&mut socket, "200 OK", html).await?;
                return Ok(code.clone());
            }

            if let Some(error) = params.get("error") {
                let description = params
                    .get("error_description")
                    .map(String::as_str)
                    .unwrap_or("Unknown error");
                let html = callback_html(&format!("Error: {} - {}", error, description));
                send_response(&mut socket, "400 Bad Request", html).await?;
                return Err(AuthError::Flow(format!("{}: {}", error, description)));
            }

            // Favicon requests and the like.
            send_response(&mut socket, "404 Not Found", callback_html("Not found")).await?;
        }
    })
    .await
    .map_err(|_| AuthError::Timeout(timeout_secs))?
}

/// Read the request line and drain the headers.
async fn read_request_head(socket: &mut TcpStream) -> Result<String, AuthError> {
    let mut reader = BufReader::new(socket);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(AuthError::Callback)?;

    loop {
        let mut header = String::new();
        let n = reader
            .read_line(&mut header)
            .await
            .map_err(AuthError::Callback)?;
        if n == 0 || header.trim().is_empty() {
            break;
        }
    }
    Ok(request_line)
}

/// Pull the authorization code out of a pasted redirect URL or bare code.
pub(crate) fn extract_code(input: &str, expected_state: &str) -> Result<String, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::Flow("no authorization code entered".to_string()));
    }

    let Some((_, query)) = input.split_once('?') else {
        return Ok(input.to_string());
    };
    let params = parse_query_params(query.split('#').next().unwrap_or(query));

    if let Some(error) = params.get("error") {
        return Err(AuthError::Flow(error.clone()));
    }
    if let Some(state) = params.get("state") {
        if state != expected_state {
            return Err(AuthError::StateMismatch);
        }
    }
    params
        .get("code")
        .cloned()
        .ok_or_else(|| AuthError::Flow("redirect URL has no code parameter".to_string()))
}

/// Parse URL query parameters into a HashMap
fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let decoded = urlencoding::decode(value).ok()?;
            Some((key.to_string(), decoded.into_owned()))
        })
        .collect()
}

/// Send an HTML response to the browser.
async fn send_response(socket: &mut TcpStream, status: &str, html: String) -> Result<(), AuthError> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        html.len(),
        html
    );
    socket
        .write_all(response.as_bytes())
        .await
        .map_err(AuthError::Callback)?;
    socket.flush().await.map_err(AuthError::Callback)
}

fn callback_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Search Console authorization</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
            background: #f1f3f4;
        }}
        .container {{
            background: white;
            padding: 2rem;
            border-radius: 8px;
            box-shadow: 0 2px 12px rgba(0,0,0,0.15);
            text-align: center;
            max-width: 400px;
        }}
        p {{
            color: #5f6368;
            line-height: 1.6;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>searchconsole</h1>
        <p>{}</p>
    </div>
</body>
</html>"#,
        message
    )
}
