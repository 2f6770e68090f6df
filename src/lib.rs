//! Symbolic path reachability analysis.
//!
//! Given the source text of a small statically-typed imperative program,
//! the analyzer parses it, builds a hierarchical execution context tree of
//! the nested conditionals and assignments, enumerates every root-to-leaf
//! path, compiles each path into a conjunction of integer/boolean
//! constraints, and checks each conjunction for satisfiability. Branches
//! whose path constraints are unsatisfiable are reported as unreachable,
//! annotated with the source line range of their `if` statement.
//!
//! Stages run in strict sequence per request: parse → validate → context
//! tree → path enumeration → condition lowering → solving → note assembly.
//! There is no shared mutable state between requests.

pub mod ast;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod eval;
pub mod parser;
pub mod paths;
pub mod process;
pub mod report;
pub mod solver;
pub mod term;
pub mod token;
pub mod validate;

pub use config::{AnalysisConfig, CancelFlag};
pub use error::{AnalysisError, ErrorEnvelope, SolverFailure};
pub use report::PathNote;
pub use solver::SatResult;

use report::{Trace, Warnings};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One analysis request: the source text plus configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub source_text: String,
    #[serde(flatten)]
    pub config: AnalysisConfig,
}

impl AnalyzeRequest {
    #[must_use]
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            config: AnalysisConfig::default(),
        }
    }
}

/// The success result document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub notes: Vec<PathNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<String>>,
}

impl AnalysisReport {
    /// Wire form: a bare note list unless warnings or a trace were
    /// requested, in which case an object carrying all three.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        if self.warnings.is_none() && self.trace.is_none() {
            serde_json::to_value(&self.notes).unwrap_or_default()
        } else {
            serde_json::to_value(self).unwrap_or_default()
        }
    }
}

/// Run one analysis.
pub fn analyze(request: &AnalyzeRequest) -> Result<AnalysisReport, AnalysisError> {
    analyze_with_cancel(request, &CancelFlag::new())
}

/// Run one analysis with an external cancellation handle.
pub fn analyze_with_cancel(
    request: &AnalyzeRequest,
    cancel: &CancelFlag,
) -> Result<AnalysisReport, AnalysisError> {
    let config = &request.config;
    let deadline = Instant::now() + Duration::from_millis(config.analysis_timeout_ms);
    let mut warnings = Warnings::default();
    let mut trace = Trace::new(config.logging);

    let program = parser::parse(&request.source_text).map_err(|e| {
        AnalysisError::PrecheckFailed {
            diagnostics: vec![e.to_string()],
        }
    })?;
    let diagnostics = validate::check(&program);
    if !diagnostics.is_empty() {
        return Err(AnalysisError::PrecheckFailed { diagnostics });
    }
    trace.stage(format!(
        "precheck passed: {} top-level item(s)",
        program.items.len()
    ));

    let tree = context::build(&program, &mut warnings);
    trace.stage(format!(
        "context tree built: {} context(s), {} symbol(s)",
        tree.len(),
        tree.root.symbols.len()
    ));

    let paths = paths::enumerate(&tree);
    trace.stage(format!("paths enumerated: {}", paths.len()));

    let notes = driver::solve(
        &tree,
        &paths,
        config,
        deadline,
        cancel,
        &mut warnings,
        &mut trace,
    )?;
    let notes = report::dedup_notes(notes);
    trace.stage(format!("notes assembled: {}", notes.len()));

    Ok(AnalysisReport {
        notes,
        warnings: config.warnings.then(|| warnings.into_vec()),
        trace: config.logging.then(|| trace.into_vec()),
    })
}

/// The façade seam: JSON request document in, JSON result document out.
///
/// Success renders the note list (or the object form when warnings or a
/// trace were requested); every failure renders the `{error}` envelope.
#[must_use]
pub fn analyze_json(body: &str) -> String {
    let request: AnalyzeRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            let envelope = ErrorEnvelope {
                error: format!("invalid request document: {e}"),
            };
            return serde_json::to_string(&envelope).unwrap_or_default();
        }
    };
    match analyze(&request) {
        Ok(report) => report.to_json().to_string(),
        Err(e) => serde_json::to_string(&e.envelope()).unwrap_or_default(),
    }
}
