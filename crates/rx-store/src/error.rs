//! Error types for the record store.

use std::path::PathBuf;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading, saving or filling the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error while reading or writing a dataset file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dataset file could not be parsed.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Dataset could not be written.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A record points at a visit, encounter or order that doesn't exist.
    #[error("{kind} {id} referenced but not present")]
    DanglingReference { kind: &'static str, id: u64 },

    /// Two records of the same kind share an identifier.
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },

    /// An order disagrees with the encounter or visit it is placed in.
    #[error("order {order_id} is inconsistent: {reason}")]
    Inconsistent { order_id: u64, reason: String },
}

impl StoreError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a dangling reference error.
    pub fn dangling(kind: &'static str, id: u64) -> Self {
        Self::DanglingReference { kind, id }
    }

    /// Creates a duplicate identifier error.
    pub fn duplicate(kind: &'static str, id: u64) -> Self {
        Self::DuplicateId { kind, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::dangling("encounter", 10).to_string(),
            "encounter 10 referenced but not present"
        );
        assert_eq!(
            StoreError::duplicate("visit", 3).to_string(),
            "duplicate visit id 3"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = StoreError::io_error(
            "/missing/dataset.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "I/O error at /missing/dataset.json: not found");
    }
}
