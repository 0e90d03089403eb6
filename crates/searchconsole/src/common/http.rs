//! HTTP Client Utilities

use std::time::Duration;

use crate::config::Settings;

/// Create a reqwest client with the configured timeouts. One client is
/// shared by the token endpoint calls and the API transport.
pub fn create_http_client(settings: &Settings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .user_agent(concat!("searchconsole/", env!("CARGO_PKG_VERSION")))
        .build()
}
