//! Error types for record parsing.

use thiserror::Error;

/// Errors raised while interpreting record fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Order action text is not one of NEW, REVISE or DISCONTINUE.
    #[error("unknown order action: {0}")]
    UnknownOrderAction(String),
}

/// Result type for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
