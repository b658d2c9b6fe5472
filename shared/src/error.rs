//! Unified error handling
//!
//! Typed errors for the POS core and the status-code contract for the
//! HTTP layer sitting above it:
//! - [`PosError`] - error taxonomy
//! - [`PosResult`] - result alias
//!
//! # Error code scheme
//!
//! | Code | Variant | Status |
//! |------|------------|--------|
//! | E0001 | Internal | 500 |
//! | E0002 | Validation | 400 |
//! | E0003 | NotFound | 404 |
//! | E0004 | Conflict | 409 |
//!
//! # Example
//!
//! ```
//! use shared::error::PosError;
//!
//! let err = PosError::not_found("Order 42");
//! assert_eq!(err.status_code().as_u16(), 404);
//! assert_eq!(err.code(), "E0003");
//! ```

use http::StatusCode;
use thiserror::Error;

/// POS core errors
///
/// The core never returns bare `Option`s for failed lookups; unknown ids
/// surface as `NotFound`, ordering violations as `Conflict`, bad input as
/// `Validation`. The HTTP layer maps everything else to 500.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PosError {
    #[error("Resource not found: {0}")]
    /// Unknown order or item id (404)
    NotFound(String),

    #[error("Conflict: {0}")]
    /// Operation out of order, e.g. bill print with pending items (409)
    Conflict(String),

    #[error("Validation failed: {0}")]
    /// Missing or malformed input (400)
    Validation(String),

    #[error("Internal error: {0}")]
    /// Unexpected failure (500)
    Internal(String),
}

impl PosError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Internal(_) => "E0001",
            Self::Validation(_) => "E0002",
            Self::NotFound(_) => "E0003",
            Self::Conflict(_) => "E0004",
        }
    }

    /// HTTP status the calling layer should translate this error to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PosResult<T> = Result<T, PosError>;
