//! Error types for controller operations

use confvault_model::Operation;
use confvault_store::StoreError;

use crate::gateway::TransportError;

/// Errors from fetching, submitting, backing up or restoring items
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Gateway failure, passed through unchanged
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Kind has no path for the operation
    #[error("item kind '{kind}' does not support {op}")]
    Unsupported {
        /// Kind name
        kind: &'static str,
        /// Requested operation
        op: Operation,
    },

    /// Operation needs an identifier the payload does not carry
    #[error("item of kind '{kind}' has no identifier")]
    MissingIdentity {
        /// Kind name
        kind: &'static str,
    },

    /// Backup file failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Create unsupported operation error
    #[must_use]
    pub fn unsupported(kind: &'static str, op: Operation) -> Self {
        Self::Unsupported { kind, op }
    }

    /// Check if the controller reported the resource as absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_not_found())
    }
}

/// Result type alias for controller operations
pub type ApiResult<T> = Result<T, ApiError>;
