//! Analysis configuration and cancellation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const fn default_analysis_timeout_ms() -> u64 {
    10_000
}

const fn default_path_solver_timeout_ms() -> u64 {
    2_000
}

/// Per-request configuration options.
///
/// All fields have defaults so a request carrying only `sourceText` is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Emit non-fatal warnings in the response document.
    pub warnings: bool,

    /// Include a per-stage trace in the response document.
    pub logging: bool,

    /// Also surface informational notes for reachable conditional paths.
    pub include_reachable: bool,

    /// Wall-clock bound for the whole request, in milliseconds.
    pub analysis_timeout_ms: u64,

    /// Solver bound per enumerated path, in milliseconds.
    pub path_solver_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            warnings: false,
            logging: false,
            include_reachable: false,
            analysis_timeout_ms: default_analysis_timeout_ms(),
            path_solver_timeout_ms: default_path_solver_timeout_ms(),
        }
    }
}

/// Cloneable cancellation handle.
///
/// The driver polls it between paths and the solver polls it inside its
/// search loops, so an in-flight analysis can be abandoned at the SMT stage.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
