//! Built-in satisfiability check for path constraints.
//!
//! The theory is quantifier-free linear integer arithmetic plus booleans,
//! which covers every constraint the condition evaluator can produce.
//! Pipeline: negation-normal form (comparison flipping, integer
//! disequality split, boolean-equality expansion), case split on
//! disjunctions, then a Fourier–Motzkin elimination over the remaining
//! conjunction with integer bound tightening.
//!
//! Verdicts are conservative in one direction only: `Unsat` is always
//! sound. Constraints the procedure cannot represent (non-linear products,
//! sort confusion, arithmetic overflow) are dropped and degrade a
//! satisfiable answer to `Unknown`, never an unsatisfiable one.

use crate::config::CancelFlag;
use crate::error::SolverFailure;
use crate::term::{Sort, Term};
use std::collections::BTreeMap;
use std::time::Instant;

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown,
}

/// One solver instance per path. Owns the asserted conjunction.
pub struct Solver<'a> {
    sorts: &'a BTreeMap<String, Sort>,
    assertions: Vec<Term>,
    deadline: Option<Instant>,
    timeout_ms: u64,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> Solver<'a> {
    #[must_use]
    pub fn new(sorts: &'a BTreeMap<String, Sort>) -> Self {
        Self {
            sorts,
            assertions: Vec::new(),
            deadline: None,
            timeout_ms: 0,
            cancel: None,
        }
    }

    pub fn set_deadline(&mut self, deadline: Instant, timeout_ms: u64) {
        self.deadline = Some(deadline);
        self.timeout_ms = timeout_ms;
    }

    pub fn set_cancel(&mut self, cancel: &'a CancelFlag) {
        self.cancel = Some(cancel);
    }

    pub fn assert(&mut self, term: Term) {
        self.assertions.push(term);
    }

    /// Check satisfiability of the asserted conjunction.
    pub fn check(&self) -> Result<SatResult, SolverFailure> {
        let conjuncts = self
            .assertions
            .iter()
            .map(|t| self.nnf(t, false))
            .collect();
        self.split(conjuncts)
    }

    fn tick(&self) -> Result<(), SolverFailure> {
        if let Some(cancel) = self.cancel {
            if cancel.is_cancelled() {
                return Err(SolverFailure::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SolverFailure::Timeout {
                    timeout_ms: self.timeout_ms,
                });
            }
        }
        Ok(())
    }

    /// Negation-normal form. Comparisons absorb negation by flipping;
    /// integer disequality splits into `< ∨ >`; boolean equality expands
    /// into its two-case disjunction.
    fn nnf(&self, term: &Term, negate: bool) -> Term {
        match term {
            Term::Top => Term::Top,
            Term::BoolLit(v) => Term::BoolLit(*v != negate),
            Term::Var(name) => match self.sorts.get(name) {
                Some(Sort::Bool) => {
                    if negate {
                        Term::var(name.clone()).not()
                    } else {
                        Term::var(name.clone())
                    }
                }
                // An integer variable in boolean position: permissive.
                _ => Term::Top,
            },
            Term::Not(inner) => self.nnf(inner, !negate),
            Term::And(a, b) => {
                if negate {
                    self.nnf(a, true).or(self.nnf(b, true))
                } else {
                    self.nnf(a, false).and(self.nnf(b, false))
                }
            }
            Term::Or(a, b) => {
                if negate {
                    self.nnf(a, true).and(self.nnf(b, true))
                } else {
                    self.nnf(a, false).or(self.nnf(b, false))
                }
            }
            Term::Lt(a, b) => self.cmp(negate, Term::Lt((*a).clone(), (*b).clone()), |a, b| {
                a.ge(b)
            }),
            Term::Le(a, b) => self.cmp(negate, Term::Le((*a).clone(), (*b).clone()), |a, b| {
                a.gt(b)
            }),
            Term::Gt(a, b) => self.cmp(negate, Term::Gt((*a).clone(), (*b).clone()), |a, b| {
                a.le(b)
            }),
            Term::Ge(a, b) => self.cmp(negate, Term::Ge((*a).clone(), (*b).clone()), |a, b| {
                a.lt(b)
            }),
            Term::Eq(a, b) => {
                let boolish = a.sort(self.sorts) == Sort::Bool || b.sort(self.sorts) == Sort::Bool;
                if boolish {
                    let (pa, na) = (self.nnf(a, false), self.nnf(a, true));
                    let (pb, nb) = (self.nnf(b, false), self.nnf(b, true));
                    if negate {
                        pa.and(nb).or(na.and(pb))
                    } else {
                        pa.and(pb).or(na.and(nb))
                    }
                } else if negate {
                    let lt = Term::Lt(a.clone(), b.clone());
                    let gt = Term::Gt(a.clone(), b.clone());
                    lt.or(gt)
                } else {
                    Term::Eq(a.clone(), b.clone())
                }
            }
            // Integer-sorted terms in boolean position: permissive.
            Term::IntLit(_) | Term::Add(_, _) | Term::Sub(_, _) | Term::Mul(_, _) => Term::Top,
        }
    }

    fn cmp(
        &self,
        negate: bool,
        keep: Term,
        flip: impl FnOnce(Term, Term) -> Term,
    ) -> Term {
        if !negate {
            return keep;
        }
        match keep {
            Term::Lt(a, b) | Term::Le(a, b) | Term::Gt(a, b) | Term::Ge(a, b) => flip(*a, *b),
            other => other,
        }
    }

    /// DPLL-style case split: flatten the conjunction, branch on the first
    /// disjunction, fall through to the theory check on a pure conjunction
    /// of atoms.
    fn split(&self, conjuncts: Vec<Term>) -> Result<SatResult, SolverFailure> {
        self.tick()?;

        let mut atoms = Vec::new();
        let mut queue = conjuncts;
        while let Some(term) = queue.pop() {
            match term {
                Term::And(a, b) => {
                    queue.push(*a);
                    queue.push(*b);
                }
                Term::BoolLit(false) => return Ok(SatResult::Unsat),
                Term::BoolLit(true) | Term::Top => {}
                other => atoms.push(other),
            }
        }

        if let Some(idx) = atoms.iter().position(|t| matches!(t, Term::Or(_, _))) {
            let or = atoms.swap_remove(idx);
            let mut disjuncts = Vec::new();
            flatten_or(or, &mut disjuncts);
            let mut saw_unknown = false;
            for disjunct in disjuncts {
                let mut branch = atoms.clone();
                branch.push(disjunct);
                match self.split(branch)? {
                    SatResult::Sat => return Ok(SatResult::Sat),
                    SatResult::Unknown => saw_unknown = true,
                    SatResult::Unsat => {}
                }
            }
            return Ok(if saw_unknown {
                SatResult::Unknown
            } else {
                SatResult::Unsat
            });
        }

        self.theory(&atoms)
    }

    /// Conjunction of atoms: boolean literals by assignment, integer
    /// comparisons by Fourier–Motzkin.
    fn theory(&self, atoms: &[Term]) -> Result<SatResult, SolverFailure> {
        let mut exact = true;
        let mut bools: BTreeMap<&str, bool> = BTreeMap::new();
        let mut rows: Vec<LinExpr> = Vec::new();

        fn assign<'t>(bools: &mut BTreeMap<&'t str, bool>, name: &'t str, value: bool) -> bool {
            match bools.insert(name, value) {
                Some(prev) if prev != value => false,
                _ => true,
            }
        }

        for atom in atoms {
            match atom {
                Term::Var(name) => {
                    if self.sorts.get(name.as_str()) == Some(&Sort::Bool) {
                        if !assign(&mut bools, name, true) {
                            return Ok(SatResult::Unsat);
                        }
                    } else {
                        exact = false;
                    }
                }
                Term::Not(inner) => match &**inner {
                    Term::Var(name)
                        if self.sorts.get(name.as_str()) == Some(&Sort::Bool) =>
                    {
                        if !assign(&mut bools, name, false) {
                            return Ok(SatResult::Unsat);
                        }
                    }
                    _ => exact = false,
                },
                Term::Lt(a, b) => match self.difference(a, b, 1) {
                    Some(row) => rows.push(row),
                    None => exact = false,
                },
                Term::Le(a, b) => match self.difference(a, b, 0) {
                    Some(row) => rows.push(row),
                    None => exact = false,
                },
                Term::Gt(a, b) => match self.difference(b, a, 1) {
                    Some(row) => rows.push(row),
                    None => exact = false,
                },
                Term::Ge(a, b) => match self.difference(b, a, 0) {
                    Some(row) => rows.push(row),
                    None => exact = false,
                },
                Term::Eq(a, b) => {
                    match (self.difference(a, b, 0), self.difference(b, a, 0)) {
                        (Some(ab), Some(ba)) => {
                            rows.push(ab);
                            rows.push(ba);
                        }
                        _ => exact = false,
                    }
                }
                _ => exact = false,
            }
        }

        if !self.feasible(rows, &mut exact)? {
            return Ok(SatResult::Unsat);
        }
        Ok(if exact {
            SatResult::Sat
        } else {
            SatResult::Unknown
        })
    }

    /// Linear form of `a - b + bump ≤ 0`.
    fn difference(&self, a: &Term, b: &Term, bump: i128) -> Option<LinExpr> {
        let mut row = self.linearize(a)?.sub(&self.linearize(b)?)?;
        row.constant = row.constant.checked_add(bump)?;
        Some(row.normalized())
    }

    fn linearize(&self, term: &Term) -> Option<LinExpr> {
        match term {
            Term::IntLit(n) => Some(LinExpr::constant(i128::from(*n))),
            Term::Var(name) => match self.sorts.get(name.as_str()) {
                Some(Sort::Int) | None => Some(LinExpr::variable(name.clone())),
                Some(Sort::Bool) => None,
            },
            Term::Add(a, b) => self.linearize(a)?.add(&self.linearize(b)?),
            Term::Sub(a, b) => self.linearize(a)?.sub(&self.linearize(b)?),
            Term::Mul(a, b) => {
                let la = self.linearize(a)?;
                let lb = self.linearize(b)?;
                if la.is_constant() {
                    lb.scale(la.constant)
                } else if lb.is_constant() {
                    la.scale(lb.constant)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Fourier–Motzkin elimination with integer bound tightening.
    /// Returns false only when the system is infeasible over the rationals,
    /// which implies integer infeasibility.
    fn feasible(&self, rows: Vec<LinExpr>, exact: &mut bool) -> Result<bool, SolverFailure> {
        let mut rows: Vec<LinExpr> = rows.into_iter().map(LinExpr::normalized).collect();
        let mut lower: BTreeMap<String, i128> = BTreeMap::new();
        let mut upper: BTreeMap<String, i128> = BTreeMap::new();

        loop {
            self.tick()?;

            // Constant and single-variable rows resolve immediately; the
            // latter tighten per-variable integer bounds exactly.
            let mut multi = Vec::new();
            for row in rows {
                match row.coeffs.len() {
                    0 => {
                        if row.constant > 0 {
                            return Ok(false);
                        }
                    }
                    1 => {
                        let (name, coeff) = row
                            .coeffs
                            .iter()
                            .next()
                            .map(|(n, c)| (n.clone(), *c))
                            .expect("len checked");
                        // coeff * x <= -constant
                        let rhs = -row.constant;
                        if coeff > 0 {
                            let bound = rhs.div_euclid(coeff);
                            upper
                                .entry(name)
                                .and_modify(|b| *b = (*b).min(bound))
                                .or_insert(bound);
                        } else {
                            let d = -coeff;
                            // x >= ceil(-rhs / d)
                            let bound = -rhs.div_euclid(d);
                            lower
                                .entry(name)
                                .and_modify(|b| *b = (*b).max(bound))
                                .or_insert(bound);
                        }
                    }
                    _ => multi.push(row),
                }
            }
            for (name, lo) in &lower {
                if let Some(hi) = upper.get(name) {
                    if lo > hi {
                        return Ok(false);
                    }
                }
            }

            if multi.is_empty() {
                return Ok(true);
            }

            // Eliminate the first variable of the first multi-variable row.
            let victim = multi[0]
                .coeffs
                .keys()
                .next()
                .expect("multi-variable row")
                .clone();

            let mut with_victim = Vec::new();
            let mut rest = Vec::new();
            for row in multi {
                if row.coeffs.contains_key(&victim) {
                    with_victim.push(row);
                } else {
                    rest.push(row);
                }
            }
            if let Some(hi) = upper.remove(&victim) {
                with_victim.push(LinExpr::upper_bound(victim.clone(), hi));
            }
            if let Some(lo) = lower.remove(&victim) {
                with_victim.push(LinExpr::lower_bound(victim.clone(), lo));
            }

            if with_victim
                .iter()
                .any(|row| row.coeffs.get(&victim).map_or(false, |c| c.abs() != 1))
            {
                *exact = false;
            }

            let (pos, neg): (Vec<_>, Vec<_>) = with_victim
                .into_iter()
                .partition(|row| row.coeffs[&victim] > 0);

            if !pos.is_empty() && !neg.is_empty() {
                for u in &pos {
                    for l in &neg {
                        let cu = u.coeffs[&victim];
                        let cl = -l.coeffs[&victim];
                        match u
                            .scale(cl)
                            .and_then(|su| l.scale(cu).and_then(|sl| su.add(&sl)))
                        {
                            Some(combined) => rest.push(combined.normalized()),
                            None => *exact = false,
                        }
                    }
                }
            }
            // With bounds on one side only the variable is unbounded in the
            // satisfying direction and its rows impose nothing further.

            rows = rest;
        }
    }
}

fn flatten_or(term: Term, out: &mut Vec<Term>) {
    match term {
        Term::Or(a, b) => {
            flatten_or(*a, out);
            flatten_or(*b, out);
        }
        other => out.push(other),
    }
}

/// A constraint `Σ coeff·var + constant ≤ 0` over the integers.
#[derive(Debug, Clone, Default)]
struct LinExpr {
    coeffs: BTreeMap<String, i128>,
    constant: i128,
}

impl LinExpr {
    fn constant(value: i128) -> Self {
        Self {
            coeffs: BTreeMap::new(),
            constant: value,
        }
    }

    fn variable(name: String) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(name, 1);
        Self {
            coeffs,
            constant: 0,
        }
    }

    /// `x - hi ≤ 0`
    fn upper_bound(name: String, hi: i128) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(name, 1);
        Self {
            coeffs,
            constant: -hi,
        }
    }

    /// `lo - x ≤ 0`
    fn lower_bound(name: String, lo: i128) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(name, -1);
        Self {
            coeffs,
            constant: lo,
        }
    }

    fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn add(&self, other: &Self) -> Option<Self> {
        let mut out = self.clone();
        for (name, coeff) in &other.coeffs {
            let entry = out.coeffs.entry(name.clone()).or_insert(0);
            *entry = entry.checked_add(*coeff)?;
        }
        out.constant = out.constant.checked_add(other.constant)?;
        Some(out)
    }

    fn sub(&self, other: &Self) -> Option<Self> {
        let negated = other.scale(-1)?;
        self.add(&negated)
    }

    fn scale(&self, factor: i128) -> Option<Self> {
        let mut out = Self::constant(self.constant.checked_mul(factor)?);
        for (name, coeff) in &self.coeffs {
            out.coeffs.insert(name.clone(), coeff.checked_mul(factor)?);
        }
        Some(out)
    }

    fn normalized(mut self) -> Self {
        self.coeffs.retain(|_, c| *c != 0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn int_sorts(names: &[&str]) -> BTreeMap<String, Sort> {
        names
            .iter()
            .map(|n| ((*n).to_string(), Sort::Int))
            .collect()
    }

    fn check_terms(sorts: &BTreeMap<String, Sort>, terms: Vec<Term>) -> SatResult {
        let mut solver = Solver::new(sorts);
        for t in terms {
            solver.assert(t);
        }
        solver.check().expect("check")
    }

    #[test]
    fn empty_conjunction_is_sat() {
        let sorts = int_sorts(&[]);
        assert_eq!(check_terms(&sorts, vec![]), SatResult::Sat);
    }

    #[test]
    fn simple_comparison_is_sat() {
        let sorts = int_sorts(&["a", "b"]);
        assert_eq!(
            check_terms(&sorts, vec![Term::var("a").gt(Term::var("b"))]),
            SatResult::Sat
        );
    }

    #[test]
    fn contradictory_bounds_are_unsat() {
        let sorts = int_sorts(&["a"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").gt(Term::int(0)),
                    Term::var("a").lt(Term::int(0)),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn strict_bounds_have_no_integer_gap() {
        // 0 < a < 1 has rational solutions but no integer ones.
        let sorts = int_sorts(&["a"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").gt(Term::int(0)),
                    Term::var("a").lt(Term::int(1)),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn equality_with_disequality_is_unsat() {
        let sorts = int_sorts(&["a"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").eq(Term::int(5)),
                    Term::var("a").eq(Term::int(5)).not(),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn negated_comparison_flips() {
        let sorts = int_sorts(&["a"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").gt(Term::int(0)),
                    Term::var("a").lt(Term::int(0)).not(),
                ]
            ),
            SatResult::Sat
        );
    }

    #[test]
    fn two_variable_chain_is_solved() {
        // a > b, b > c, c > a is a cycle: unsat.
        let sorts = int_sorts(&["a", "b", "c"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").gt(Term::var("b")),
                    Term::var("b").gt(Term::var("c")),
                    Term::var("c").gt(Term::var("a")),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn disjunction_branches() {
        let sorts = int_sorts(&["a"]);
        // (a < 0 || a > 10) && a == 5 → unsat on both branches.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a")
                        .lt(Term::int(0))
                        .or(Term::var("a").gt(Term::int(10))),
                    Term::var("a").eq(Term::int(5)),
                ]
            ),
            SatResult::Unsat
        );
        // One satisfiable branch suffices.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a")
                        .lt(Term::int(0))
                        .or(Term::var("a").gt(Term::int(10))),
                    Term::var("a").eq(Term::int(20)),
                ]
            ),
            SatResult::Sat
        );
    }

    #[test]
    fn boolean_conflict_is_unsat() {
        let mut sorts = BTreeMap::new();
        sorts.insert("p".to_string(), Sort::Bool);
        assert_eq!(
            check_terms(&sorts, vec![Term::var("p"), Term::var("p").not()]),
            SatResult::Unsat
        );
        assert_eq!(check_terms(&sorts, vec![Term::var("p")]), SatResult::Sat);
    }

    #[test]
    fn boolean_equality_expands() {
        let mut sorts = BTreeMap::new();
        sorts.insert("p".to_string(), Sort::Bool);
        sorts.insert("q".to_string(), Sort::Bool);
        // p == q && p && !q is unsat.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("p").eq(Term::var("q")),
                    Term::var("p"),
                    Term::var("q").not(),
                ]
            ),
            SatResult::Unsat
        );
        // p == true && !p is unsat.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("p").eq(Term::bool_(true)),
                    Term::var("p").not(),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn top_is_always_satisfied() {
        let sorts = int_sorts(&["a"]);
        assert_eq!(check_terms(&sorts, vec![Term::Top]), SatResult::Sat);
        assert_eq!(
            check_terms(&sorts, vec![Term::Top.not()]),
            SatResult::Sat
        );
        assert_eq!(
            check_terms(
                &sorts,
                vec![Term::Top, Term::var("a").gt(Term::int(0))]
            ),
            SatResult::Sat
        );
    }

    #[test]
    fn nonlinear_product_degrades_to_unknown() {
        let sorts = int_sorts(&["a", "b"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![Term::var("a").mul(Term::var("b")).gt(Term::int(0))]
            ),
            SatResult::Unknown
        );
    }

    #[test]
    fn nonlinear_cannot_mask_unsat() {
        let sorts = int_sorts(&["a", "b"]);
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").mul(Term::var("b")).gt(Term::int(0)),
                    Term::var("a").gt(Term::int(0)),
                    Term::var("a").lt(Term::int(0)),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn linear_arithmetic_is_solved() {
        let sorts = int_sorts(&["a", "b"]);
        // a + 1 > a is valid.
        assert_eq!(
            check_terms(
                &sorts,
                vec![Term::var("a").add(Term::int(1)).gt(Term::var("a"))]
            ),
            SatResult::Sat
        );
        // a + b <= 0 && a >= 1 && b >= 1 is unsat.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::var("a").add(Term::var("b")).le(Term::int(0)),
                    Term::var("a").ge(Term::int(1)),
                    Term::var("b").ge(Term::int(1)),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn scaled_variable_bounds_stay_exact() {
        let sorts = int_sorts(&["a"]);
        // 2a <= 1 forces a <= 0 over the integers.
        assert_eq!(
            check_terms(
                &sorts,
                vec![
                    Term::int(2).mul(Term::var("a")).le(Term::int(1)),
                    Term::var("a").ge(Term::int(1)),
                ]
            ),
            SatResult::Unsat
        );
    }

    #[test]
    fn expired_deadline_reports_timeout() {
        let sorts = int_sorts(&["a"]);
        let mut solver = Solver::new(&sorts);
        solver.assert(Term::var("a").gt(Term::int(0)));
        solver.set_deadline(Instant::now() - Duration::from_millis(1), 2000);
        assert_eq!(
            solver.check(),
            Err(SolverFailure::Timeout { timeout_ms: 2000 })
        );
    }

    #[test]
    fn cancellation_reports_cancelled() {
        let sorts = int_sorts(&["a"]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut solver = Solver::new(&sorts);
        solver.set_cancel(&cancel);
        solver.assert(Term::var("a").gt(Term::int(0)));
        assert_eq!(solver.check(), Err(SolverFailure::Cancelled));
    }
}
