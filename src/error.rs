//! Error types for the analysis pipeline.

use serde::Serialize;
use thiserror::Error;

/// Fatal analysis error. Any of these aborts the request; no partial
/// results are returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Source rejected by the validator. Carries the diagnostic list.
    #[error("precheck failed: {}", .diagnostics.join("; "))]
    PrecheckFailed { diagnostics: Vec<String> },

    /// Identifier used without a prior declaration.
    #[error("unknown symbol `{name}`")]
    UnknownSymbol { name: String },

    /// A declared type outside the integer/boolean scalars.
    #[error("unsupported declared type `{ty}` for `{name}`")]
    UnsupportedType { name: String, ty: String },

    /// Solver failure, timeout, or cancellation.
    #[error("solver error: {0}")]
    Solver(#[from] SolverFailure),

    /// A bug in the analyzer itself.
    #[error("internal analyzer error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// The failure envelope returned in place of a result document.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
        }
    }

    /// True for failures caused by the input rather than the analyzer.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PrecheckFailed { .. } | Self::UnknownSymbol { .. } | Self::UnsupportedType { .. }
        )
    }
}

/// Failure raised inside the solver search loops.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SolverFailure {
    #[error("solver timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("analysis cancelled")]
    Cancelled,
}

/// The `{error}` document surfaced for every fatal category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub error: String,
}
