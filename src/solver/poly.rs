//! Multivariate polynomials over the prime field
//!
//! Used by the native backend as a normal form for constraint terms. A
//! polynomial is a map from monomials (sorted variable lists, repeated for
//! powers) to nonzero coefficients, so two equal polynomials always have the
//! same representation.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::circuit::VarId;
use crate::field::{FieldDomain, FieldElement, PrimeField};

/// Sorted multiset of variables; the empty monomial is the constant term
pub type Monomial = Vec<VarId>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, FieldElement>,
}

/// Shape of a polynomial, as far as propagation cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Zero,
    Constant(FieldElement),
    /// `a·x + b` with `a != 0`
    Linear {
        var: VarId,
        a: FieldElement,
        b: FieldElement,
    },
    Open,
}

impl Poly {
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of monomials
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn vars(&self) -> BTreeSet<VarId> {
        self.terms.keys().flat_map(|m| m.iter().copied()).collect()
    }

    pub fn mentions(&self, var: VarId) -> bool {
        self.terms.keys().any(|m| m.contains(&var))
    }

    /// Split off `a·var` when `var` occurs in no other monomial
    ///
    /// Returns `(a, rest)` such that `self = a·var + rest`.
    pub fn linear_in(&self, var: VarId) -> Option<(FieldElement, Poly)> {
        let key = vec![var];
        let a = self.terms.get(&key)?.clone();
        let mut rest = self.clone();
        rest.terms.remove(&key);
        if rest.mentions(var) {
            return None;
        }
        Some((a, rest))
    }

    pub fn shape(&self) -> Shape {
        if self.terms.is_empty() {
            return Shape::Zero;
        }

        let mut var = None;
        let mut a = None;
        let mut b = None;
        for (mono, coeff) in &self.terms {
            match mono.as_slice() {
                [] => b = Some(coeff.clone()),
                [x] if var.is_none() || var == Some(*x) => {
                    var = Some(*x);
                    a = Some(coeff.clone());
                }
                _ => return Shape::Open,
            }
        }

        match (var, a, b) {
            (Some(var), Some(a), b) => Shape::Linear {
                var,
                a,
                b: b.unwrap_or_default(),
            },
            (_, _, Some(b)) => Shape::Constant(b),
            _ => Shape::Open,
        }
    }
}

/// Bounds on a single expansion
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_terms: usize,
    pub deadline: Option<Instant>,
}

/// Why a bounded expansion gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    TooLarge,
    Deadline,
}

impl Limits {
    pub const NONE: Limits = Limits {
        max_terms: usize::MAX,
        deadline: None,
    };

    /// Products between two clock reads
    const CLOCK_STRIDE: u64 = 256;

    fn tick(&self, work: u64) -> Result<(), Overflow> {
        match self.deadline {
            Some(deadline) if work % Self::CLOCK_STRIDE == 0 && Instant::now() >= deadline => {
                Err(Overflow::Deadline)
            }
            _ => Ok(()),
        }
    }

    fn fits(&self, p: &Poly) -> Result<(), Overflow> {
        if p.len() > self.max_terms {
            return Err(Overflow::TooLarge);
        }
        Ok(())
    }
}

/// [`FieldDomain`] over polynomials
///
/// `eq` yields the difference of both sides, which is zero exactly when the
/// equation holds identically.
#[derive(Debug, Clone, Copy)]
pub struct PolyRing<'f> {
    field: &'f PrimeField,
}

impl<'f> PolyRing<'f> {
    pub fn new(field: &'f PrimeField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &'f PrimeField {
        self.field
    }

    pub fn var(&self, id: VarId) -> Poly {
        let mut terms = BTreeMap::new();
        terms.insert(vec![id], self.field.one());
        Poly { terms }
    }

    pub fn scale(&self, p: &Poly, k: &FieldElement) -> Poly {
        if k.is_zero() {
            return Poly::default();
        }
        Poly {
            terms: p
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), self.field.mul(c, k)))
                .collect(),
        }
    }

    /// Replace variables by polynomials; `lookup` returns `None` to keep a variable
    pub fn substitute<F>(&self, p: &Poly, lookup: F) -> Poly
    where
        F: Fn(VarId) -> Option<Poly>,
    {
        // an unlimited expansion never overflows
        self.substitute_within(p, lookup, &Limits::NONE)
            .unwrap_or_default()
    }

    /// [`PolyRing::substitute`], giving up as soon as an intermediate
    /// polynomial exceeds `limits.max_terms` or the deadline passes
    pub fn substitute_within<F>(&self, p: &Poly, lookup: F, limits: &Limits) -> Result<Poly, Overflow>
    where
        F: Fn(VarId) -> Option<Poly>,
    {
        let mut out = Poly::default();
        for (mono, coeff) in &p.terms {
            let mut term = self.constant(coeff);
            for v in mono {
                let factor = lookup(*v).unwrap_or_else(|| self.var(*v));
                term = self.product(&term, &factor, limits)?;
                if term.is_zero() {
                    break;
                }
            }
            out = self.add(&out, &term);
            limits.fits(&out)?;
        }
        Ok(out)
    }

    fn product(&self, a: &Poly, b: &Poly, limits: &Limits) -> Result<Poly, Overflow> {
        let mut terms = BTreeMap::new();
        let mut work = 0u64;
        for (ma, ca) in &a.terms {
            for (mb, cb) in &b.terms {
                limits.tick(work)?;
                work += 1;

                let mut mono = Vec::with_capacity(ma.len() + mb.len());
                mono.extend_from_slice(ma);
                mono.extend_from_slice(mb);
                mono.sort();
                self.insert(&mut terms, mono, self.field.mul(ca, cb));
                if terms.len() > limits.max_terms {
                    return Err(Overflow::TooLarge);
                }
            }
        }
        Ok(Poly { terms })
    }

    /// Substitute concrete values for assigned variables
    pub fn assign(&self, p: &Poly, values: &[Option<FieldElement>]) -> Poly {
        self.substitute(p, |v| {
            values
                .get(v.index())
                .and_then(|x| x.as_ref())
                .map(|x| self.constant(x))
        })
    }

    fn insert(&self, terms: &mut BTreeMap<Monomial, FieldElement>, mono: Monomial, coeff: FieldElement) {
        let sum = match terms.remove(&mono) {
            Some(existing) => self.field.add(&existing, &coeff),
            None => coeff,
        };
        if !sum.is_zero() {
            terms.insert(mono, sum);
        }
    }
}

impl FieldDomain for PolyRing<'_> {
    type Value = Poly;
    type Predicate = Poly;

    fn constant(&self, c: &FieldElement) -> Poly {
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(Vec::new(), c.clone());
        }
        Poly { terms }
    }

    fn zero(&self) -> Poly {
        Poly::default()
    }

    fn one(&self) -> Poly {
        self.constant(&self.field.one())
    }

    fn add(&self, a: &Poly, b: &Poly) -> Poly {
        let mut terms = a.terms.clone();
        for (mono, coeff) in &b.terms {
            self.insert(&mut terms, mono.clone(), coeff.clone());
        }
        Poly { terms }
    }

    fn mul(&self, a: &Poly, b: &Poly) -> Poly {
        self.product(a, b, &Limits::NONE).unwrap_or_default()
    }

    fn neg(&self, a: &Poly) -> Poly {
        Poly {
            terms: a
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), self.field.neg(c)))
                .collect(),
        }
    }

    fn eq(&self, a: &Poly, b: &Poly) -> Poly {
        self.sub(a, b)
    }
}
