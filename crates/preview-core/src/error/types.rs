//! Core error types for the preview subsystem

use thiserror::Error;

/// Result type alias for preview operations
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Main error type for preview sessions and caching
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    /// The request is missing data or asks for an impossible transition
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The session or key does not exist, or has expired
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// The distributed cache could not be reached
    #[error("Backend unavailable ({backend}): {message}")]
    BackendUnavailable { backend: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// The external page renderer failed
    #[error("Render error: {message}")]
    Render { message: String },
}

impl PreviewError {
    /// Stable code for programmatic error identification
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "PREVIEW_VALIDATION",
            Self::NotFound { .. } => "PREVIEW_NOT_FOUND",
            Self::BackendUnavailable { .. } => "PREVIEW_BACKEND_UNAVAILABLE",
            Self::Config { .. } => "PREVIEW_CONFIG",
            Self::Json { .. } => "PREVIEW_JSON",
            Self::Render { .. } => "PREVIEW_RENDER",
        }
    }

    /// The field a validation error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
