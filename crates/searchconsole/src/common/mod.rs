//! Common Utilities
//!
//! Path resolution and HTTP client construction shared by the auth and API
//! layers.

pub mod http;
pub mod paths;

pub use http::create_http_client;
pub use paths::{config_path, credentials_path, searchconsole_dir, searchconsole_path};
