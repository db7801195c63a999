//! Error types for idxsel core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while generating, evaluating or selecting indexes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Algorithm configuration violates a precondition.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the violated precondition.
        message: String,
    },

    /// An index could not be constructed from the given columns.
    #[error("invalid index: {message}")]
    InvalidIndex {
        /// Description of the violated index invariant.
        message: String,
    },

    /// The what-if backend failed to answer a cost or size request.
    #[error("cost oracle failure: {message}")]
    Oracle {
        /// Description of the failure, as reported by the backend.
        message: String,
    },

    /// The what-if backend does not provide the requested capability.
    #[error("operation not supported by cost backend: {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// Internal invariant of a selection algorithm was broken.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        /// Description of the broken invariant.
        message: String,
    },

    /// No storage-saving relaxation is left but the configuration is still over budget.
    #[error("budget unreachable: configuration needs {size} bytes, budget is {budget} bytes")]
    BudgetUnreachable {
        /// Size of the configuration that could not be relaxed further.
        size: u64,
        /// Storage budget in bytes.
        budget: u64,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid index error.
    pub fn invalid_index(message: impl Into<String>) -> Self {
        Self::InvalidIndex {
            message: message.into(),
        }
    }

    /// Creates a cost oracle error.
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates an invariant violation error.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Returns true if the error originates from the what-if backend.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Self::Oracle { .. } | Self::Unsupported { .. })
    }
}
