//! FX engine error types.

use thiserror::Error;
use xrate_common::{ErrorKind, ValidationError};

/// Errors that can occur in the FX engine.
///
/// Cloneable so that a single failed refresh can be handed to every caller
/// awaiting it.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// Provider unreachable or returned an unusable response.
    #[error("Rate provider {provider} failed: {message}")]
    Upstream { provider: String, message: String },

    /// Invalid currency code or amount.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FxError {
    /// Create an upstream error for the named provider.
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        FxError::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FxError::Upstream { .. } => ErrorKind::UpstreamFetch,
            FxError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Get error code for structured responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Upstream { .. } => "UPSTREAM_FETCH_FAILED",
            FxError::Validation(e) => e.error_code(),
        }
    }

    /// Check if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::Upstream { .. })
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
