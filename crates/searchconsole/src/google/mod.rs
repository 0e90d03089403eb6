//! Google API Client Module
//!
//! Authenticated HTTP access to the Search Console REST API. Bearer tokens
//! come from the [`Authorizer`](crate::auth::Authorizer) and never leave
//! this process.

pub mod client;
pub mod webmasters;

pub use client::GoogleClient;
pub use webmasters::SearchConsoleApi;
