//! Google Search Console client
//!
//! Authenticate, pick a web property, and run search analytics queries
//! through an immutable builder:
//!
//! ```no_run
//! # async fn run() -> searchconsole::Result<()> {
//! use searchconsole::{authenticate, CredentialSource, Settings};
//!
//! let settings = Settings::load()?;
//! let account = authenticate(CredentialSource::File(settings.credentials_file()?), &settings).await?;
//! let property = account
//!     .get("https://www.example.com/")
//!     .expect("property is registered");
//!
//! let report = property
//!     .query()
//!     .range("today", "today")?
//!     .dimensions(["query", "page"])?
//!     .get()
//!     .await?;
//! println!("{}", report.to_dataframe());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod auth;
pub mod common;
pub mod config;
pub mod error;
pub mod google;
pub mod query;
pub mod report;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{Account, PermissionLevel, WebProperty};
pub use auth::{authenticate, AuthError, AuthorizedUser, ClientSecrets, CredentialSource, Flow, ServiceAccountKey, Source};
pub use config::Settings;
pub use error::{Error, Result};
pub use query::{
    AggregationType, DataState, DateRange, Dimension, Metric, Operator, Query, QueryRequest,
    QuerySpec, SearchType,
};
pub use report::{DataFrame, Report, Row};
pub use transport::{Transport, TransportError};
