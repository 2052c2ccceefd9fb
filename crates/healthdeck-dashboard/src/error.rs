//! # Design
//!
//! - Keep error messages constant while carrying context fields for debugging.
//! - Errors stay inside the dashboard; public operations turn them into
//!   outcome values after logging.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for dashboard internals.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Failures raised while talking to the health service.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The request never produced a response.
    #[error("http request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("http request returned non-success status")]
    HttpStatus {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Status code returned.
        status: StatusCode,
    },
    /// The response body could not be decoded.
    #[error("response body could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// An endpoint URL could not be derived from the base URL.
    #[error("endpoint url is invalid")]
    InvalidUrl {
        /// Operation identifier.
        operation: &'static str,
        /// Path that failed to join.
        path: String,
        /// Source URL parse error.
        source: url::ParseError,
    },
    /// The stored credential cannot be carried in a header.
    #[error("credential contains characters not allowed in a header")]
    InvalidCredential {
        /// Operation identifier.
        operation: &'static str,
    },
}

impl DashboardError {
    /// Operation the failure belongs to, for log fields.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Http { operation, .. }
            | Self::HttpStatus { operation, .. }
            | Self::Decode { operation, .. }
            | Self::InvalidUrl { operation, .. }
            | Self::InvalidCredential { operation } => operation,
        }
    }

    /// Status code for non-success responses.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_expose_operation_and_code() {
        let err = DashboardError::HttpStatus {
            operation: "issues.load",
            url: "http://localhost/api/issues".into(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.operation(), "issues.load");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "http request returned non-success status");

        let credential = DashboardError::InvalidCredential {
            operation: "matrix.load",
        };
        assert_eq!(credential.operation(), "matrix.load");
        assert!(credential.status().is_none());
    }
}
