//! Error Types
//!
//! Validation errors raised synchronously by the query builder, plus the
//! transport and auth errors that pass through unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("invalid dimension '{value}': {reason} (expected one of: {allowed})")]
    InvalidDimension {
        value: String,
        reason: &'static str,
        allowed: String,
    },

    #[error("invalid filter operator '{value}' (expected one of: {allowed})")]
    InvalidOperator { value: String, allowed: String },

    #[error("invalid search type '{value}' (expected one of: {allowed})")]
    InvalidSearchType { value: String, allowed: String },

    #[error("invalid {name} '{value}' (expected {expected})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        expected: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn invalid_argument(
        name: &'static str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name,
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// True for errors raised by local validation, before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidRange(_)
                | Error::InvalidDimension { .. }
                | Error::InvalidOperator { .. }
                | Error::InvalidSearchType { .. }
                | Error::InvalidArgument { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_value_and_allowed_set() {
        let err = Error::InvalidSearchType {
            value: "bogus".to_string(),
            allowed: "web, image".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("web, image"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_transport_error_is_not_validation() {
        let err = Error::from(TransportError::Api {
            status: 403,
            message: "User does not have sufficient permission".to_string(),
            body: "{}".to_string(),
        });
        assert!(!err.is_validation());
        assert!(err.to_string().contains("403"));
    }
}
