//! In-process backend
//!
//! Works in two phases:
//!
//! 1. **Elimination**: every equation that is linear in some variable `x`
//!    defines `x` in terms of the others, and that definition is substituted
//!    everywhere. Constant pins, public inputs and most gate outputs disappear
//!    this way. If an equation collapses to a nonzero constant, or the
//!    property collapses to the zero polynomial, the system is unsatisfiable
//!    for every assignment. Substitutions are abandoned once they grow past
//!    [`MAX_TERMS`] monomials or the deadline passes.
//! 2. **Search**: the remaining constraints are explored depth-first over a
//!    small candidate set per variable, with unit propagation of forced
//!    values. A witness found this way is a genuine SAT answer; running out
//!    of candidates only yields UNKNOWN, since the field is far too large to
//!    enumerate.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::circuit::VarId;
use crate::constraint::{ConstraintSystem, Origin, Relation};
use crate::error::SolverBackendError;
use crate::field::{FieldDomain, FieldElement, PrimeField};

use super::poly::{Limits, Overflow, Poly, PolyRing, Shape};
use super::{Backend, BackendAnswer, Budget, Model};

/// Substitutions producing larger polynomials are skipped
const MAX_TERMS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sense {
    /// poly == 0
    Zero,
    /// poly != 0
    NonZero,
}

#[derive(Debug, Clone)]
struct Check {
    origin: Origin,
    sense: Sense,
    poly: Poly,
}

enum Elimination {
    Done,
    Conflict(Origin),
    Timeout,
}

enum Step {
    Found,
    Failed,
    Aborted(String),
}

/// Built-in backend; needs no external solver
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn native_field(&self) -> bool {
        true
    }

    #[tracing::instrument(skip_all, name = "NativeBackend::check")]
    fn check(
        &self,
        system: &ConstraintSystem,
        field: &PrimeField,
        budget: Budget,
    ) -> Result<BackendAnswer, SolverBackendError> {
        let start = Instant::now();
        let ring = PolyRing::new(field);
        let checks = lower(system, &ring)?;

        let mut search = Search {
            ring,
            checks,
            definitions: Vec::new(),
            deadline: budget.deadline_from(start),
            max_nodes: budget.max_search_nodes,
            nodes: 0,
        };

        match search.eliminate() {
            Elimination::Conflict(origin) => {
                tracing::debug!(%origin, "contradiction during elimination");
                return Ok(BackendAnswer::Unsat);
            }
            Elimination::Timeout => {
                return Ok(BackendAnswer::Unknown(format!(
                    "time budget of {} ms exhausted during elimination",
                    budget.timeout.as_millis()
                )));
            }
            Elimination::Done => {}
        }

        let remaining = search.checks.iter().filter(|c| !c.is_settled()).count();
        tracing::debug!(
            eliminated = search.definitions.len(),
            remaining,
            "elimination finished"
        );

        search.decide(system.variable_count)
    }
}

/// Normalize every active constraint into a polynomial check
fn lower(system: &ConstraintSystem, ring: &PolyRing<'_>) -> Result<Vec<Check>, SolverBackendError> {
    let var = |id: VarId| Some(ring.var(id));
    let mut checks = Vec::new();

    for constraint in system.active() {
        let (sense, lhs, rhs) = match &constraint.relation {
            Relation::Equal(lhs, rhs) => (Sense::Zero, lhs, rhs),
            Relation::NotEqual(lhs, rhs) => (Sense::NonZero, lhs, rhs),
            // residues are in range by construction
            Relation::InRange(_) | Relation::True => continue,
        };
        let (Some(l), Some(r)) = (lhs.fold(ring, &var), rhs.fold(ring, &var)) else {
            return Err(SolverBackendError::Reported(format!(
                "cannot normalize {}",
                constraint.origin
            )));
        };
        checks.push(Check {
            origin: constraint.origin,
            sense,
            poly: ring.eq(&l, &r),
        });
    }
    Ok(checks)
}

impl Check {
    /// Satisfied no matter how the remaining variables are chosen
    fn is_settled(&self) -> bool {
        match self.sense {
            Sense::Zero => self.poly.is_zero(),
            Sense::NonZero => matches!(self.poly.shape(), Shape::Constant(_)),
        }
    }

    fn violated_by(&self, reduced: &Poly) -> bool {
        matches!(
            (self.sense, reduced.shape()),
            (Sense::Zero, Shape::Constant(_)) | (Sense::NonZero, Shape::Zero)
        )
    }
}

struct Search<'f> {
    ring: PolyRing<'f>,
    checks: Vec<Check>,
    /// `x := poly`, in elimination order; polys mention only free variables
    definitions: Vec<(VarId, Poly)>,
    deadline: Instant,
    max_nodes: u64,
    nodes: u64,
}

impl Search<'_> {
    fn field(&self) -> &PrimeField {
        self.ring.field()
    }

    fn conflict(&self) -> Option<Origin> {
        self.checks
            .iter()
            .find(|c| c.violated_by(&c.poly))
            .map(|c| c.origin)
    }

    fn eliminate(&mut self) -> Elimination {
        if let Some(origin) = self.conflict() {
            return Elimination::Conflict(origin);
        }

        loop {
            let mut progress = false;
            for i in 0..self.checks.len() {
                if Instant::now() >= self.deadline {
                    return Elimination::Timeout;
                }
                if self.checks[i].sense != Sense::Zero || self.checks[i].poly.is_zero() {
                    continue;
                }
                match self.eliminate_one(i) {
                    Ok(true) => {
                        progress = true;
                        if let Some(origin) = self.conflict() {
                            return Elimination::Conflict(origin);
                        }
                    }
                    Ok(false) => {}
                    Err(_) => return Elimination::Timeout,
                }
            }
            if !progress {
                return Elimination::Done;
            }
        }
    }

    /// Solve check `i` for one of its variables and substitute it away
    ///
    /// Candidates whose substitution grows too large are skipped; only a
    /// passed deadline is returned as an error.
    fn eliminate_one(&mut self, i: usize) -> Result<bool, Overflow> {
        let poly = self.checks[i].poly.clone();
        let limits = Limits {
            max_terms: MAX_TERMS,
            deadline: Some(self.deadline),
        };

        // later variables are usually gate outputs
        for x in poly.vars().into_iter().rev() {
            let Some((a, rest)) = poly.linear_in(x) else {
                continue;
            };
            let Some(a_inv) = self.field().inv(&a) else {
                continue;
            };
            let definition = self.ring.scale(&self.ring.neg(&rest), &a_inv);

            let lookup = |v: VarId| (v == x).then(|| definition.clone());
            let rewrite = |p: &Poly| match self.ring.substitute_within(p, lookup, &limits) {
                Ok(q) => Ok(Some(q)),
                Err(Overflow::TooLarge) => Ok(None),
                Err(Overflow::Deadline) => Err(Overflow::Deadline),
            };

            let mut too_large = false;
            let mut updated_checks = Vec::new();
            for (j, check) in self.checks.iter().enumerate() {
                if j != i && check.poly.mentions(x) {
                    match rewrite(&check.poly)? {
                        Some(q) => updated_checks.push((j, q)),
                        None => {
                            too_large = true;
                            break;
                        }
                    }
                }
            }
            let mut updated_defs = Vec::new();
            if !too_large {
                for (k, (_, def)) in self.definitions.iter().enumerate() {
                    if def.mentions(x) {
                        match rewrite(def)? {
                            Some(q) => updated_defs.push((k, q)),
                            None => {
                                too_large = true;
                                break;
                            }
                        }
                    }
                }
            }
            if too_large {
                tracing::trace!(var = %x, "substitution too large, trying another variable");
                continue;
            }

            for (j, p) in updated_checks {
                self.checks[j].poly = p;
            }
            for (k, p) in updated_defs {
                self.definitions[k].1 = p;
            }
            self.checks[i].poly = Poly::default();
            self.definitions.push((x, definition));
            return Ok(true);
        }
        Ok(false)
    }

    /// Propagate at the root, then search
    ///
    /// A conflict before any branching is forced by the constraints alone,
    /// so it refutes the system.
    fn decide(&mut self, variable_count: usize) -> Result<BackendAnswer, SolverBackendError> {
        let mut values = vec![None; variable_count];
        if let Err(origin) = self.propagate(&mut values) {
            tracing::debug!(%origin, "contradiction forced by propagation");
            return Ok(BackendAnswer::Unsat);
        }

        match self.search(&mut values) {
            Step::Found => {
                tracing::debug!(nodes = self.nodes, "search found an assignment");
                Ok(BackendAnswer::Sat(self.model(values)?))
            }
            Step::Failed => Ok(BackendAnswer::Unknown(format!(
                "bounded search exhausted after {} nodes without a witness",
                self.nodes
            ))),
            Step::Aborted(reason) => Ok(BackendAnswer::Unknown(reason)),
        }
    }

    /// Force values implied by single-unknown linear equations
    fn propagate(&self, values: &mut [Option<FieldElement>]) -> Result<(), Origin> {
        loop {
            let mut changed = false;
            for check in self.checks.iter().filter(|c| !(c.sense == Sense::Zero && c.poly.is_zero())) {
                let reduced = self.ring.assign(&check.poly, values);
                if check.violated_by(&reduced) {
                    return Err(check.origin);
                }
                if check.sense == Sense::Zero {
                    if let Shape::Linear { var, a, b } = reduced.shape() {
                        if let Some(a_inv) = self.field().inv(&a) {
                            let forced = self.field().mul(&self.field().neg(&b), &a_inv);
                            values[var.index()] = Some(forced);
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Pick the variable occurring in the most open checks (lowest index on ties),
    /// with hint values that dodge nearby disequalities
    fn branch(&self, values: &[Option<FieldElement>]) -> Option<(VarId, Vec<FieldElement>)> {
        let mut counts: BTreeMap<VarId, usize> = BTreeMap::new();
        let mut hints: BTreeMap<VarId, Vec<FieldElement>> = BTreeMap::new();

        for check in &self.checks {
            let reduced = self.ring.assign(&check.poly, values);
            let open = match (check.sense, reduced.shape()) {
                (Sense::Zero, Shape::Zero) | (Sense::NonZero, Shape::Constant(_)) => false,
                (Sense::NonZero, Shape::Linear { var, a, b }) => {
                    if let Some(a_inv) = self.field().inv(&a) {
                        let excluded = self.field().mul(&self.field().neg(&b), &a_inv);
                        let avoid = self.field().add(&excluded, &self.field().one());
                        hints.entry(var).or_default().push(avoid);
                    }
                    true
                }
                _ => true,
            };
            if open {
                for v in reduced.vars() {
                    *counts.entry(v).or_default() += 1;
                }
            }
        }

        let (&var, _) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))?;
        Some((var, hints.remove(&var).unwrap_or_default()))
    }

    fn candidates(&self, hints: Vec<FieldElement>) -> Vec<FieldElement> {
        let field = self.field();
        let mut out: Vec<FieldElement> = Vec::new();
        let fixed = [field.zero(), field.one(), field.from_i64(2), field.from_i64(-1)];
        for c in hints.into_iter().chain(fixed) {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    fn search(&mut self, values: &mut Vec<Option<FieldElement>>) -> Step {
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Step::Aborted(format!("search node budget of {} exhausted", self.max_nodes));
        }
        if Instant::now() >= self.deadline {
            return Step::Aborted(format!("time budget exhausted after {} search nodes", self.nodes));
        }

        if self.propagate(values).is_err() {
            return Step::Failed;
        }
        let Some((var, hints)) = self.branch(values) else {
            return Step::Found;
        };

        for candidate in self.candidates(hints) {
            let mut next = values.clone();
            next[var.index()] = Some(candidate);
            match self.search(&mut next) {
                Step::Found => {
                    *values = next;
                    return Step::Found;
                }
                Step::Failed => continue,
                aborted @ Step::Aborted(_) => return aborted,
            }
        }
        Step::Failed
    }

    /// Complete a partial assignment: free variables default to zero,
    /// eliminated ones are recomputed from their definitions
    fn model(&self, values: Vec<Option<FieldElement>>) -> Result<Model, SolverBackendError> {
        let mut full: Vec<Option<FieldElement>> = values
            .into_iter()
            .map(|v| Some(v.unwrap_or_default()))
            .collect();

        for (x, def) in &self.definitions {
            let value = match self.ring.assign(def, &full).shape() {
                Shape::Zero => self.field().zero(),
                Shape::Constant(c) => c,
                _ => return Err(SolverBackendError::MissingModelValue(x.0)),
            };
            full[x.index()] = Some(value);
        }

        Ok(full
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (VarId(i as u32), v.to_bigint())))
            .collect())
    }
}
