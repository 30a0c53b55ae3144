//! Error types and handling
//!
//! All fallible operations in this crate return [`ComResult`]. Failures that
//! abort a call (unknown setting names, malformed tags, transport faults) are
//! expressed as [`ComError`] variants; per-item failures in batch operations
//! are reported through `OperationStatus` instead so a batch can continue.

use thiserror::Error;

use crate::models::SettingsCategory;

/// Client error types
#[derive(Debug, Error)]
pub enum ComError {
    /// A named setting does not resolve in the region's settings catalog
    #[error("setting '{name}' of category {category} cannot be found in the region")]
    SettingNotFound {
        category: SettingsCategory,
        name: String,
    },

    /// Auto-add tag string does not match `<name>=<value>`
    #[error("invalid auto-add tag '{0}': expected <name>=<value> using letters, digits, spaces or _.:+-@")]
    InvalidTagFormat(String),

    /// Parameter validation failed before any request was sent
    #[error("validation error: {0}")]
    Validation(String),

    /// The API answered with a non-success HTTP status
    #[error("request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Network-level failure talking to the API
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body that could not be deserialized
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),

    /// Configuration loading or validation failure
    #[error("configuration error: {0}")]
    Config(String),
}

impl ComError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        ComError::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ComError::Config(msg.into())
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ComError::Api { status, .. } => Some(*status),
            ComError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error carries an HTTP 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the error aborts a batch operation outright. Misconfigured
    /// requests must never be sent, so these propagate instead of turning
    /// into a per-item Failed status.
    pub fn is_terminating(&self) -> bool {
        matches!(
            self,
            ComError::SettingNotFound { .. }
                | ComError::InvalidTagFormat(_)
                | ComError::Validation(_)
                | ComError::Config(_)
        )
    }
}

// Implement From for common error types

impl From<validator::ValidationErrors> for ComError {
    fn from(err: validator::ValidationErrors) -> Self {
        ComError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ComError {
    fn from(err: serde_json::Error) -> Self {
        ComError::InvalidResponse(err.to_string())
    }
}

/// Result type alias for client operations
pub type ComResult<T> = Result<T, ComError>;
