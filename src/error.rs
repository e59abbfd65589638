//! Error types for dbweave.

use thiserror::Error;

use crate::codec::CodecError;

/// The main error type for statement construction and execution.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// A builder call arrived after a clause lock made it illegal.
    #[error("State violation: {0}")]
    StateViolation(String),

    /// Update or delete without a predicate and without an explicit override.
    #[error("Unsafe operation: {0}")]
    UnsafeOperation(String),

    /// Two properties resolve to the same column.
    #[error("Ambiguous mapping: {0}")]
    AmbiguousMapping(String),

    /// The dialect does not implement a requested capability.
    #[error("Dialect '{dialect}' does not support {capability}")]
    DialectCapabilityMissing {
        dialect: &'static str,
        capability: &'static str,
    },

    /// Property not declared on a strict table mapping.
    #[error("Unknown property '{property}' on table '{table}'")]
    UnknownProperty { table: String, property: String },

    /// A mapping or template is malformed.
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// A builder argument that cannot form valid SQL, such as an empty IN list.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Insert without rows, or update without a SET list.
    #[error("Nothing to write: {0}")]
    NothingToWrite(&'static str),

    /// Value conversion failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Failed to parse a filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WeaveError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a state violation error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateViolation(message.into())
    }

    /// Create an unsafe operation error.
    pub fn unsafe_op(message: impl Into<String>) -> Self {
        Self::UnsafeOperation(message.into())
    }

    /// Create an ambiguous mapping error.
    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::AmbiguousMapping(message.into())
    }

    /// Create an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Self {
        Self::InvalidMapping(message.into())
    }

    /// Create a missing-capability error.
    pub fn capability(dialect: &'static str, capability: &'static str) -> Self {
        Self::DialectCapabilityMissing {
            dialect,
            capability,
        }
    }
}

/// Result type alias for dbweave operations.
pub type WeaveResult<T> = Result<T, WeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WeaveError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_capability_display() {
        let err = WeaveError::capability("standard", "paging");
        assert_eq!(err.to_string(), "Dialect 'standard' does not support paging");
    }

    #[test]
    fn test_codec_error_converts() {
        let err: WeaveError = CodecError::InvalidData("bad uuid".into()).into();
        assert!(matches!(err, WeaveError::Codec(_)));
    }
}
