//! Symbolic field terms and constraints
//!
//! Terms are solver-independent; each backend lowers them into its own
//! language (SMT-LIB text, or polynomials for the native search).

use std::collections::BTreeSet;
use std::fmt;

use crate::circuit::VarId;
use crate::field::{FieldDomain, FieldElement, PrimeField};

/// Field-valued expression over circuit variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Const(FieldElement),
    Var(VarId),
    /// n-ary sum
    Add(Vec<Term>),
    /// n-ary product
    Mul(Vec<Term>),
    Neg(Box<Term>),
}

impl Term {
    /// Collect every variable the term mentions
    pub fn collect_vars(&self, out: &mut BTreeSet<VarId>) {
        match self {
            Term::Const(_) => {}
            Term::Var(id) => {
                out.insert(*id);
            }
            Term::Add(parts) | Term::Mul(parts) => {
                for part in parts {
                    part.collect_vars(out);
                }
            }
            Term::Neg(inner) => inner.collect_vars(out),
        }
    }

    /// Interpret the term in any field domain
    ///
    /// `var` supplies the domain value of each variable; `None` aborts the fold.
    pub fn fold<D, F>(&self, domain: &D, var: &F) -> Option<D::Value>
    where
        D: FieldDomain,
        F: Fn(VarId) -> Option<D::Value>,
    {
        match self {
            Term::Const(c) => Some(domain.constant(c)),
            Term::Var(id) => var(*id),
            Term::Add(parts) => {
                let mut acc = domain.zero();
                for part in parts {
                    acc = domain.add(&acc, &part.fold(domain, var)?);
                }
                Some(acc)
            }
            Term::Mul(parts) => {
                let mut acc = domain.one();
                for part in parts {
                    acc = domain.mul(&acc, &part.fold(domain, var)?);
                }
                Some(acc)
            }
            Term::Neg(inner) => Some(domain.neg(&inner.fold(domain, var)?)),
        }
    }

    /// Concrete value under an assignment, if every variable is assigned
    pub fn evaluate<F>(&self, field: &PrimeField, value: &F) -> Option<FieldElement>
    where
        F: Fn(VarId) -> Option<FieldElement>,
    {
        self.fold(field, value)
    }
}

/// Relation asserted by a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Trivially satisfied (e.g. an all-zero gate)
    True,
    Equal(Term, Term),
    NotEqual(Term, Term),
    /// `0 <= v < p`, needed only where integers stand in for field elements
    InRange(VarId),
}

impl Relation {
    /// Whether the relation holds under a full assignment; `None` if a variable is missing
    pub fn holds<F>(&self, field: &PrimeField, value: &F) -> Option<bool>
    where
        F: Fn(VarId) -> Option<FieldElement>,
    {
        match self {
            Relation::True => Some(true),
            Relation::Equal(lhs, rhs) => Some(lhs.evaluate(field, value)? == rhs.evaluate(field, value)?),
            Relation::NotEqual(lhs, rhs) => Some(lhs.evaluate(field, value)? != rhs.evaluate(field, value)?),
            // canonical values are in range by construction
            Relation::InRange(id) => value(*id).map(|_| true),
        }
    }

    pub fn collect_vars(&self, out: &mut BTreeSet<VarId>) {
        match self {
            Relation::True => {}
            Relation::Equal(lhs, rhs) | Relation::NotEqual(lhs, rhs) => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            Relation::InRange(id) => {
                out.insert(*id);
            }
        }
    }
}

/// Where a constraint came from, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Domain(VarId),
    Constant(VarId),
    PublicInput(VarId),
    Gate(usize),
    Property,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Domain(id) => write!(f, "range of {}", id),
            Origin::Constant(id) => write!(f, "constant {}", id),
            Origin::PublicInput(id) => write!(f, "public input {}", id),
            Origin::Gate(index) => write!(f, "gate {}", index),
            Origin::Property => write!(f, "property"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub origin: Origin,
    pub relation: Relation,
}

impl Constraint {
    pub fn new(origin: Origin, relation: Relation) -> Self {
        Self { origin, relation }
    }
}

/// Symbolic field domain: builds [`Term`]s instead of computing numbers
///
/// Borrowing the field explicitly keeps every encoder free of global state.
#[derive(Debug, Clone, Copy)]
pub struct Symbolic<'f> {
    field: &'f PrimeField,
}

impl<'f> Symbolic<'f> {
    pub fn new(field: &'f PrimeField) -> Self {
        Self { field }
    }

    pub fn var(&self, id: VarId) -> Term {
        Term::Var(id)
    }

    pub fn ne(&self, a: &Term, b: &Term) -> Relation {
        Relation::NotEqual(a.clone(), b.clone())
    }
}

impl FieldDomain for Symbolic<'_> {
    type Value = Term;
    type Predicate = Relation;

    fn constant(&self, c: &FieldElement) -> Term {
        Term::Const(c.clone())
    }

    fn zero(&self) -> Term {
        Term::Const(self.field.zero())
    }

    fn one(&self) -> Term {
        Term::Const(self.field.one())
    }

    fn add(&self, a: &Term, b: &Term) -> Term {
        let mut parts = Vec::new();
        for t in [a, b] {
            match t {
                Term::Add(inner) => parts.extend(inner.iter().cloned()),
                other => parts.push(other.clone()),
            }
        }
        Term::Add(parts)
    }

    fn mul(&self, a: &Term, b: &Term) -> Term {
        let mut parts = Vec::new();
        for t in [a, b] {
            match t {
                Term::Mul(inner) => parts.extend(inner.iter().cloned()),
                other => parts.push(other.clone()),
            }
        }
        Term::Mul(parts)
    }

    fn neg(&self, a: &Term) -> Term {
        match a {
            Term::Neg(inner) => (**inner).clone(),
            Term::Const(c) => Term::Const(self.field.neg(c)),
            other => Term::Neg(Box::new(other.clone())),
        }
    }

    fn eq(&self, a: &Term, b: &Term) -> Relation {
        Relation::Equal(a.clone(), b.clone())
    }
}
