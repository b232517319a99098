//! Field operations shared by the concrete and the symbolic world
//!
//! Encoders are written once against [`FieldDomain`]: evaluated with
//! [`PrimeField`] they produce numbers, evaluated with
//! [`crate::constraint::Symbolic`] they produce solver terms.

use super::element::{FieldElement, PrimeField};

/// add / mul / neg / eq over some representation of field values
pub trait FieldDomain {
    /// A field value (a number, or a term)
    type Value: Clone;

    /// Result of comparing two values (a bool, or a constraint)
    type Predicate;

    fn constant(&self, c: &FieldElement) -> Self::Value;

    fn zero(&self) -> Self::Value;

    fn one(&self) -> Self::Value;

    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn mul(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn neg(&self, a: &Self::Value) -> Self::Value;

    fn eq(&self, a: &Self::Value, b: &Self::Value) -> Self::Predicate;

    fn sub(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        self.add(a, &self.neg(b))
    }
}

impl FieldDomain for PrimeField {
    type Value = FieldElement;
    type Predicate = bool;

    fn constant(&self, c: &FieldElement) -> FieldElement {
        c.clone()
    }

    fn zero(&self) -> FieldElement {
        PrimeField::zero(self)
    }

    fn one(&self) -> FieldElement {
        PrimeField::one(self)
    }

    fn add(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        PrimeField::add(self, a, b)
    }

    fn mul(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        PrimeField::mul(self, a, b)
    }

    fn neg(&self, a: &FieldElement) -> FieldElement {
        PrimeField::neg(self, a)
    }

    fn eq(&self, a: &FieldElement, b: &FieldElement) -> bool {
        a == b
    }

    fn sub(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        PrimeField::sub(self, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double_plus_one<D: FieldDomain>(domain: &D, x: &D::Value) -> D::Value {
        let two_x = domain.add(x, x);
        domain.add(&two_x, &domain.one())
    }

    #[test]
    fn test_generic_code_runs_concretely() {
        let field = PrimeField::bn254();
        let x = field.from_i64(20);
        let y = double_plus_one(&field, &x);
        assert!(FieldDomain::eq(&field, &y, &field.from_i64(41)));
    }

    #[test]
    fn test_default_sub_wraps() {
        let field = PrimeField::bn254();
        let a = field.from_i64(3);
        let b = field.from_i64(5);
        assert_eq!(FieldDomain::sub(&field, &a, &b), field.from_i64(-2));
    }
}
