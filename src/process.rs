//! Statement processor.
//!
//! Flattens each path into its condition list: assignments and
//! polarity-tagged branch predicates, each with the set of identifiers it
//! references. Also collects the path's free variables, the symbolic
//! parameters the solver will quantify over.

use crate::ast::{Expr, LineRange};
use crate::paths::{Path, Step};
use std::collections::BTreeSet;

/// The per-path normalized form of one context.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<'t> {
    Assign {
        variable: &'t str,
        expression: &'t Expr,
        referenced_vars: BTreeSet<String>,
    },
    Branch {
        expression: &'t Expr,
        polarity: bool,
        line_range: LineRange,
        referenced_vars: BTreeSet<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionList<'t> {
    pub conditions: Vec<Condition<'t>>,
    /// Referenced variables that are never assigned on this path.
    pub free_vars: BTreeSet<String>,
}

/// Lower a path into its condition list.
#[must_use]
pub fn lower<'t>(path: &Path<'t>) -> ConditionList<'t> {
    let mut conditions = Vec::with_capacity(path.steps.len());
    let mut referenced = BTreeSet::new();
    let mut assigned = BTreeSet::new();

    for step in &path.steps {
        match step {
            Step::Assign(assign) => {
                let mut vars = BTreeSet::new();
                collect_idents(&assign.expression, &mut vars);
                referenced.extend(vars.iter().cloned());
                assigned.insert(assign.var_name.clone());
                conditions.push(Condition::Assign {
                    variable: &assign.var_name,
                    expression: &assign.expression,
                    referenced_vars: vars,
                });
            }
            Step::Branch { ctx, polarity } => {
                let mut vars = BTreeSet::new();
                collect_idents(&ctx.predicate, &mut vars);
                referenced.extend(vars.iter().cloned());
                conditions.push(Condition::Branch {
                    expression: &ctx.predicate,
                    polarity: *polarity,
                    line_range: ctx.line_range,
                    referenced_vars: vars,
                });
            }
        }
    }

    let free_vars = referenced.difference(&assigned).cloned().collect();
    ConditionList {
        conditions,
        free_vars,
    }
}

/// Collect every identifier the evaluator will resolve through the
/// environment. Opaque constructs (property accesses, calls, `this`)
/// evaluate permissively without symbol lookup, so they contribute nothing.
pub fn collect_idents(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Ident { name, .. } => {
            out.insert(name.clone());
        }
        Expr::Unary { operand, .. } => collect_idents(operand, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_idents(lhs, out);
            collect_idents(rhs, out);
        }
        Expr::Conditional {
            cond, then_, else_, ..
        } => {
            collect_idents(cond, out);
            collect_idents(then_, out);
            collect_idents(else_, out);
        }
        Expr::Num { .. }
        | Expr::Bool { .. }
        | Expr::Str { .. }
        | Expr::This
        | Expr::Property { .. }
        | Expr::Call { .. }
        | Expr::Arrow(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build;
    use crate::parser::parse;
    use crate::paths::enumerate;
    use crate::report::Warnings;

    fn lowered(source: &str) -> Vec<(Vec<&'static str>, BTreeSet<String>)> {
        // Returns per path: condition kinds and free vars. Kept simple on
        // purpose; the scenarios exercise the real content.
        let program = parse(source).expect("parse");
        let mut warnings = Warnings::default();
        let tree = build(&program, &mut warnings);
        let paths = enumerate(&tree);
        paths
            .iter()
            .map(|p| {
                let list = lower(p);
                let kinds = list
                    .conditions
                    .iter()
                    .map(|c| match c {
                        Condition::Assign { .. } => "assign",
                        Condition::Branch { .. } => "branch",
                    })
                    .collect();
                (kinds, list.free_vars)
            })
            .collect()
    }

    #[test]
    fn branch_conditions_carry_polarity_and_range() {
        let program = parse("function f(a: number) { if (a > 0) { return 1; } }").expect("parse");
        let mut warnings = Warnings::default();
        let tree = build(&program, &mut warnings);
        let paths = enumerate(&tree);
        let first = lower(&paths[0]);
        let Condition::Branch {
            polarity,
            line_range,
            referenced_vars,
            ..
        } = &first.conditions[0]
        else {
            panic!("expected branch");
        };
        assert!(*polarity);
        assert_eq!(line_range.start, 1);
        assert!(referenced_vars.contains("a"));
    }

    #[test]
    fn free_vars_exclude_assigned_locals() {
        let rows = lowered(
            "function f(a: number) { const x = 5; if (a == x) { if (a != 5) { return 1; } } }",
        );
        // Deepest branch path: assign + two branches, free vars only `a`.
        let (kinds, free) = &rows[1];
        assert_eq!(kinds, &vec!["assign", "branch", "branch"]);
        assert_eq!(free.iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn free_vars_are_function_parameters() {
        let rows = lowered(
            "function f(a: number, b: number) { if (a > b) { return 1; } else { return 2; } }",
        );
        for (_, free) in &rows {
            assert!(free.iter().all(|v| v == "a" || v == "b"));
        }
    }

    #[test]
    fn undeclared_reference_shows_up_free() {
        let rows = lowered("function f(a: number) { if (z > 0) { return 1; } }");
        assert!(rows[0].1.contains("z"));
    }

    #[test]
    fn collect_idents_handles_nesting() {
        let program = parse("function f(a: number) { if (a > 0 && b < c + 1) {} }").expect("parse");
        let mut warnings = Warnings::default();
        let tree = build(&program, &mut warnings);
        let paths = enumerate(&tree);
        let list = lower(&paths[0]);
        let Condition::Branch {
            referenced_vars, ..
        } = &list.conditions[0]
        else {
            panic!("expected branch");
        };
        assert_eq!(
            referenced_vars.iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }
}
