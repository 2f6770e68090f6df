//! Per-path solver dispatch and verdict mapping.
//!
//! For each enumerated path: declare a sorted symbol for every free
//! variable, process assignments as substitutions into the environment,
//! conjoin the branch predicates (negated on false polarity), and ask the
//! solver. Unsatisfiable paths produce an unreachable note attributed to
//! the innermost conditional on the path; `unknown` produces a reachable
//! note with an explanation.

use crate::config::{AnalysisConfig, CancelFlag};
use crate::context::{ContextTree, DeclaredType};
use crate::error::{AnalysisError, SolverFailure};
use crate::eval::{eval, Env};
use crate::paths::Path;
use crate::process::{lower, Condition};
use crate::report::{PathNote, Trace, Warnings};
use crate::solver::{SatResult, Solver};
use crate::term::Sort;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Solve every path and collect notes in path-enumeration order.
pub fn solve(
    tree: &ContextTree,
    paths: &[Path<'_>],
    config: &AnalysisConfig,
    deadline: Instant,
    cancel: &CancelFlag,
    warnings: &mut Warnings,
    trace: &mut Trace,
) -> Result<Vec<PathNote>, AnalysisError> {
    let sorts = declared_sorts(tree);
    let mut notes = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(SolverFailure::Cancelled.into());
        }
        if Instant::now() >= deadline {
            return Err(SolverFailure::Timeout {
                timeout_ms: config.analysis_timeout_ms,
            }
            .into());
        }

        let list = lower(path);
        for name in &list.free_vars {
            match tree.root.symbols.get(name) {
                Some(DeclaredType::Int | DeclaredType::Bool) => {}
                Some(DeclaredType::Other(ty)) => {
                    return Err(AnalysisError::UnsupportedType {
                        name: name.clone(),
                        ty: ty.clone(),
                    })
                }
                None => {
                    return Err(AnalysisError::UnknownSymbol { name: name.clone() })
                }
            }
        }

        let mut env = Env::seed(&tree.root);
        let mut solver = Solver::new(&sorts);
        let path_deadline = deadline.min(
            Instant::now() + Duration::from_millis(config.path_solver_timeout_ms),
        );
        solver.set_deadline(path_deadline, config.path_solver_timeout_ms);
        solver.set_cancel(cancel);

        for condition in &list.conditions {
            match condition {
                Condition::Assign {
                    variable,
                    expression,
                    ..
                } => {
                    let value = eval(expression, &env, warnings)?;
                    env.set(*variable, value);
                }
                Condition::Branch {
                    expression,
                    polarity,
                    ..
                } => {
                    let term = eval(expression, &env, warnings)?;
                    let term = if *polarity { term } else { term.not() };
                    solver.assert(term);
                }
            }
        }

        let verdict = solver.check()?;
        trace.stage(format!("path {index}: {}", verdict_name(verdict)));

        match verdict {
            SatResult::Unsat => {
                if let Some((branch, _)) = path.innermost_branch() {
                    notes.push(PathNote {
                        start_line: branch.line_range.start,
                        end_line: branch.line_range.end,
                        reachable: false,
                        explanation: None,
                    });
                }
            }
            SatResult::Unknown => {
                if let Some((branch, _)) = path.innermost_branch() {
                    notes.push(PathNote {
                        start_line: branch.line_range.start,
                        end_line: branch.line_range.end,
                        reachable: true,
                        explanation: Some("solver returned unknown".to_string()),
                    });
                }
            }
            SatResult::Sat => {
                if config.include_reachable {
                    if let Some((branch, _)) = path.innermost_branch() {
                        notes.push(PathNote {
                            start_line: branch.line_range.start,
                            end_line: branch.line_range.end,
                            reachable: true,
                            explanation: None,
                        });
                    }
                }
            }
        }
    }

    Ok(notes)
}

const fn verdict_name(verdict: SatResult) -> &'static str {
    match verdict {
        SatResult::Sat => "sat",
        SatResult::Unsat => "unsat",
        SatResult::Unknown => "unknown",
    }
}

/// Solver sorts for every integer or boolean symbol in the root table.
fn declared_sorts(tree: &ContextTree) -> BTreeMap<String, Sort> {
    let mut sorts = BTreeMap::new();
    for (name, ty) in &tree.root.symbols {
        match ty {
            DeclaredType::Int => {
                sorts.insert(name.clone(), Sort::Int);
            }
            DeclaredType::Bool => {
                sorts.insert(name.clone(), Sort::Bool);
            }
            DeclaredType::Other(_) => {}
        }
    }
    sorts
}
