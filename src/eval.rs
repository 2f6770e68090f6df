//! Condition evaluator: expression AST fragments to solver terms.
//!
//! Identifiers resolve through a per-path environment. Assignments update
//! the environment, so later references see the assigned right-hand side
//! until re-assigned (substitution form of SSA-at-usage). Unrecognized
//! operators and constructs are logged and evaluate to the permissive
//! [`Term::Top`] sentinel so they never manufacture unreachability.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::context::{DeclaredType, RootContext};
use crate::error::AnalysisError;
use crate::report::Warnings;
use crate::term::Term;
use std::collections::BTreeMap;

/// Per-path environment mapping identifiers to solver terms.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: BTreeMap<String, Term>,
}

impl Env {
    /// Seed the environment from the root symbol table: every integer or
    /// boolean symbol starts as a free solver variable of its own name.
    #[must_use]
    pub fn seed(root: &RootContext) -> Self {
        let mut bindings = BTreeMap::new();
        for (name, ty) in &root.symbols {
            match ty {
                DeclaredType::Int | DeclaredType::Bool => {
                    bindings.insert(name.clone(), Term::var(name.clone()));
                }
                DeclaredType::Other(_) => {}
            }
        }
        Self { bindings }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, term: Term) {
        self.bindings.insert(name.into(), term);
    }
}

/// Translate an expression into a solver term.
pub fn eval(expr: &Expr, env: &Env, warnings: &mut Warnings) -> Result<Term, AnalysisError> {
    match expr {
        Expr::Num { value, .. } => Ok(Term::int(*value)),
        Expr::Bool { value } => Ok(Term::bool_(*value)),
        Expr::Ident { name, .. } => env
            .get(name)
            .cloned()
            .ok_or_else(|| AnalysisError::UnknownSymbol { name: name.clone() }),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Ok(eval(operand, env, warnings)?.not()),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => Ok(Term::int(0).sub(eval(operand, env, warnings)?)),
        // The non-null assertion is transparent.
        Expr::Unary {
            op: UnaryOp::NonNull,
            operand,
        } => eval(operand, env, warnings),
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env, warnings),
        other => {
            warnings.push(format!(
                "treating unsupported expression `{}` as true",
                other.kind()
            ));
            Ok(Term::Top)
        }
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &Env,
    warnings: &mut Warnings,
) -> Result<Term, AnalysisError> {
    let combine: fn(Term, Term) -> Term = match op {
        BinOp::Lt => Term::lt,
        BinOp::Le => Term::le,
        BinOp::Gt => Term::gt,
        BinOp::Ge => Term::ge,
        BinOp::EqEq => Term::eq,
        BinOp::NotEq => |a: Term, b: Term| a.eq(b).not(),
        BinOp::AndAnd => Term::and,
        BinOp::OrOr => Term::or,
        BinOp::Add => Term::add,
        BinOp::Sub => Term::sub,
        BinOp::Mul => Term::mul,
        BinOp::Assign
        | BinOp::EqEqEq
        | BinOp::NotEqEq
        | BinOp::Div
        | BinOp::Rem
        | BinOp::BitAnd
        | BinOp::BitOr
        | BinOp::BitXor
        | BinOp::Shl
        | BinOp::Shr => {
            warnings.push(format!(
                "treating unsupported operator `{}` as true",
                op.symbol()
            ));
            return Ok(Term::Top);
        }
    };
    let left = eval(lhs, env, warnings)?;
    let right = eval(rhs, env, warnings)?;
    Ok(combine(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build;
    use crate::parser::parse;
    use crate::report::Warnings;

    fn env_for(source: &str) -> Env {
        let program = parse(source).expect("parse");
        let mut warnings = Warnings::default();
        let tree = build(&program, &mut warnings);
        Env::seed(&tree.root)
    }

    fn first_predicate(source: &str) -> Expr {
        let program = parse(source).expect("parse");
        let mut warnings = Warnings::default();
        let tree = build(&program, &mut warnings);
        let crate::context::Context::Conditional(cond) = &tree.root.children[0] else {
            panic!("expected conditional");
        };
        cond.predicate.clone()
    }

    #[test]
    fn comparison_translates_directly() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if (a > 0) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert_eq!(term, Term::var("a").gt(Term::int(0)));
        assert!(warnings.as_slice().is_empty());
    }

    #[test]
    fn not_equals_is_negated_equality() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if (a != 5) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert_eq!(term, Term::var("a").eq(Term::int(5)).not());
    }

    #[test]
    fn logical_connectives_translate() {
        let env = env_for("function f(a: number, b: number) {}");
        let expr =
            first_predicate("function f(a: number, b: number) { if (a > 0 && b < 1 || a == b) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert!(matches!(term, Term::Or(_, _)));
    }

    #[test]
    fn unknown_symbol_is_fatal() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if (z > 0) {} }");
        let mut warnings = Warnings::default();
        let err = eval(&expr, &env, &mut warnings).expect_err("should fail");
        assert_eq!(
            err,
            AnalysisError::UnknownSymbol {
                name: "z".to_string()
            }
        );
    }

    #[test]
    fn unsupported_operator_yields_top_and_warns() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if ((a & 1) == 1) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        // The `&` collapses to top; the surrounding `==` survives.
        assert_eq!(term, Term::Top.eq(Term::int(1)));
        assert_eq!(warnings.as_slice().len(), 1);
        assert!(warnings.as_slice()[0].contains('&'));
    }

    #[test]
    fn non_null_assertion_is_transparent() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if (a! > 0) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert_eq!(term, Term::var("a").gt(Term::int(0)));
    }

    #[test]
    fn assignment_substitutes_into_later_references() {
        let env = {
            let mut env = env_for("function f(a: number) {}");
            env.set("x", Term::int(5));
            env
        };
        let expr = first_predicate("function f(a: number) { if (a == x) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert_eq!(term, Term::var("a").eq(Term::int(5)));
    }

    #[test]
    fn seed_skips_unsupported_sorts() {
        let env = env_for("function f(a: number, s: string) {}");
        assert!(env.get("a").is_some());
        assert!(env.get("s").is_none());
    }

    #[test]
    fn arithmetic_translates() {
        let env = env_for("function f(a: number) {}");
        let expr = first_predicate("function f(a: number) { if (a + 1 > a * 2) {} }");
        let mut warnings = Warnings::default();
        let term = eval(&expr, &env, &mut warnings).expect("eval");
        assert_eq!(
            term,
            Term::var("a")
                .add(Term::int(1))
                .gt(Term::var("a").mul(Term::int(2)))
        );
    }
}
