//! Error types for the record model

/// Errors raised when validating identifier text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Text is not a lowercase canonical UUID
    #[error("invalid identifier: '{0}' (expected lowercase 8-4-4-4-12 hex)")]
    Invalid(String),
}
