//! Error types for order resolution.

use thiserror::Error;

use crate::traits::SourceError;

/// Errors that can occur while resolving orders or visits.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// A caller-supplied parameter was rejected before any fetch happened.
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The record source failed; the original error is kept as the source.
    #[error("Record source fetch failed: {0}")]
    UpstreamFetchFailure(#[source] SourceError),
}

impl ResolverError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type for resolver operations.
pub type ResolverResult<T> = std::result::Result<T, ResolverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_invalid_argument() {
        let err = ResolverError::invalid_argument("visit_limit", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid argument `visit_limit`: must be positive, got 0"
        );
    }

    #[test]
    fn test_error_upstream_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "db timeout");
        let err = ResolverError::UpstreamFetchFailure(Box::new(io));

        assert_eq!(err.to_string(), "Record source fetch failed: db timeout");
        let source = err.source().unwrap();
        let io = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::TimedOut);
    }
}
