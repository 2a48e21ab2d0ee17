//! Error types for the Folio engine.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using the Folio error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input to an engine operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// External collaborator (quote source) error
    #[error("External service error: {0}")]
    External(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error was caused by bad caller input (including config).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) | Self::Config(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }

    /// Shorthand for an [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
