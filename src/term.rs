//! Solver terms.
//!
//! The constraint language the per-path compiler targets: integer and
//! boolean literals, typed variables, linear arithmetic, comparisons, and
//! the boolean connectives. `Top` is the permissive sentinel produced for
//! constructs the evaluator does not recognize; the solver treats it as
//! true so unknown syntax never manufactures unreachability.

// Allow builder method names that overlap with std traits - intentional DSL design
#![allow(clippy::should_implement_trait)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Solver sorts for declared symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sort {
    Int,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    BoolLit(bool),
    IntLit(i64),
    Var(String),

    Add(Box<Term>, Box<Term>),
    Sub(Box<Term>, Box<Term>),
    Mul(Box<Term>, Box<Term>),

    Eq(Box<Term>, Box<Term>),
    Lt(Box<Term>, Box<Term>),
    Le(Box<Term>, Box<Term>),
    Gt(Box<Term>, Box<Term>),
    Ge(Box<Term>, Box<Term>),

    Not(Box<Term>),
    And(Box<Term>, Box<Term>),
    Or(Box<Term>, Box<Term>),

    /// Permissive sentinel: always satisfied, survives negation.
    Top,
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::IntLit(value)
    }

    #[must_use]
    pub const fn bool_(value: bool) -> Self {
        Self::BoolLit(value)
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::Add(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::Sub(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        Self::Mul(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::Eq(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::Lt(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn le(self, other: Self) -> Self {
        Self::Le(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::Gt(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn ge(self, other: Self) -> Self {
        Self::Ge(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// The sort of this term given the declared variable sorts.
    ///
    /// Unknown variables default to `Int`; the driver guarantees every
    /// variable reaching the solver was declared.
    #[must_use]
    pub fn sort(&self, vars: &BTreeMap<String, Sort>) -> Sort {
        match self {
            Self::IntLit(_) | Self::Add(_, _) | Self::Sub(_, _) | Self::Mul(_, _) => Sort::Int,
            Self::Var(name) => vars.get(name).copied().unwrap_or(Sort::Int),
            Self::BoolLit(_)
            | Self::Eq(_, _)
            | Self::Lt(_, _)
            | Self::Le(_, _)
            | Self::Gt(_, _)
            | Self::Ge(_, _)
            | Self::Not(_)
            | Self::And(_, _)
            | Self::Or(_, _)
            | Self::Top => Sort::Bool,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TermPrec {
    Lowest = 0,
    Or = 1,
    And = 2,
    Cmp = 3,
    Add = 4,
    Mul = 5,
    Unary = 6,
    Atom = 7,
}

const fn term_prec(term: &Term) -> TermPrec {
    match term {
        Term::Or(_, _) => TermPrec::Or,
        Term::And(_, _) => TermPrec::And,
        Term::Eq(_, _) | Term::Lt(_, _) | Term::Le(_, _) | Term::Gt(_, _) | Term::Ge(_, _) => {
            TermPrec::Cmp
        }
        Term::Add(_, _) | Term::Sub(_, _) => TermPrec::Add,
        Term::Mul(_, _) => TermPrec::Mul,
        Term::Not(_) => TermPrec::Unary,
        Term::BoolLit(_) | Term::IntLit(_) | Term::Var(_) | Term::Top => TermPrec::Atom,
    }
}

fn fmt_term(
    term: &Term,
    parent: TermPrec,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    let prec = term_prec(term);
    let needs_parens = prec < parent;
    if needs_parens {
        write!(f, "(")?;
    }

    match term {
        Term::BoolLit(v) => write!(f, "{v}")?,
        Term::IntLit(v) => write!(f, "{v}")?,
        Term::Var(name) => write!(f, "{name}")?,
        Term::Top => write!(f, "top")?,
        Term::Not(inner) => {
            write!(f, "!")?;
            fmt_term(inner, TermPrec::Unary, f)?;
        }
        Term::Add(a, b) => fmt_bin(a, "+", b, TermPrec::Add, f)?,
        Term::Sub(a, b) => fmt_bin(a, "-", b, TermPrec::Add, f)?,
        Term::Mul(a, b) => fmt_bin(a, "*", b, TermPrec::Mul, f)?,
        Term::Eq(a, b) => fmt_bin(a, "==", b, TermPrec::Cmp, f)?,
        Term::Lt(a, b) => fmt_bin(a, "<", b, TermPrec::Cmp, f)?,
        Term::Le(a, b) => fmt_bin(a, "<=", b, TermPrec::Cmp, f)?,
        Term::Gt(a, b) => fmt_bin(a, ">", b, TermPrec::Cmp, f)?,
        Term::Ge(a, b) => fmt_bin(a, ">=", b, TermPrec::Cmp, f)?,
        Term::And(a, b) => fmt_bin(a, "&&", b, TermPrec::And, f)?,
        Term::Or(a, b) => fmt_bin(a, "||", b, TermPrec::Or, f)?,
    }

    if needs_parens {
        write!(f, ")")?;
    }
    Ok(())
}

fn fmt_bin(
    a: &Term,
    op: &str,
    b: &Term,
    prec: TermPrec,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    fmt_term(a, prec, f)?;
    write!(f, " {op} ")?;
    // Right operand at one level tighter keeps same-precedence chains
    // parenthesized on the right, which reads unambiguously for `-` and the
    // comparisons.
    let tighter = match prec {
        TermPrec::Lowest => TermPrec::Or,
        TermPrec::Or => TermPrec::And,
        TermPrec::And => TermPrec::Cmp,
        TermPrec::Cmp => TermPrec::Add,
        TermPrec::Add => TermPrec::Mul,
        TermPrec::Mul => TermPrec::Unary,
        TermPrec::Unary | TermPrec::Atom => TermPrec::Atom,
    };
    fmt_term(b, tighter, f)
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_term(self, TermPrec::Lowest, f)
    }
}
