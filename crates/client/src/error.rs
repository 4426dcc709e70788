//! Domain error taxonomy.
//!
//! Every remote-call failure is caught inside the controller that issued it
//! and classified into [`StoreError`] before it reaches the view
//! collaborator; nothing is allowed to escape as an unclassified transport
//! failure. Locally-detected bad input is rejected as [`StoreError::Validation`]
//! before any network call, leaving state untouched.

use thiserror::Error;

use crate::api::ApiError;

/// Application-level error for the storefront client core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Locally detected bad input; rejected before any remote call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator call failed at the network or query layer.
    #[error("transport error: {0}")]
    Transport(#[source] ApiError),

    /// A remote call was rejected for lacking credentials. Surfaced
    /// distinctly so the view can redirect to authentication.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// A referenced entity no longer exists. Non-fatal: the affected row
    /// renders as absent instead of crashing the view.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(message) => Self::Authorization(message),
            ApiError::NotFound(what) => Self::NotFound(what),
            other => Self::Transport(other),
        }
    }
}

/// Result type alias for [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
