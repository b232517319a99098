//! Polynomial-evaluation property
//!
//! The circuit is supposed to compute `result = c_0·x^(n-1) + ... + c_(n-1)`
//! by Horner's rule. The encoder asserts the *negation*; an unsatisfiable
//! system therefore means the circuit enforces the evaluation.

use crate::circuit::InterestVars;
use crate::error::EncodingError;
use crate::field::FieldDomain;

use super::term::{Constraint, Origin, Symbolic};

/// Horner evaluation: `ev := 0; for c in coeffs { ev := ev·point + c }`
///
/// Coefficients run from the highest degree down. With no coefficients the
/// result is zero.
pub fn horner<D: FieldDomain>(domain: &D, coeffs: &[D::Value], point: &D::Value) -> D::Value {
    let mut ev = domain.zero();
    for c in coeffs {
        ev = domain.add(&domain.mul(&ev, point), c);
    }
    ev
}

/// `horner(coeffs, point) != result`
pub fn encode_property(interest: &InterestVars, sym: &Symbolic<'_>) -> Result<Constraint, EncodingError> {
    if interest.len() < 2 {
        return Err(EncodingError::PropertyArity(interest.len()));
    }

    let coeffs: Vec<_> = interest.coefficients().iter().map(|(id, _)| sym.var(*id)).collect();
    let point = sym.var(interest.point().0);
    let result = sym.var(interest.result().0);

    let ev = horner(sym, &coeffs, &point);
    tracing::debug!(degree = coeffs.len(), "encoded evaluation property");

    Ok(Constraint::new(Origin::Property, sym.ne(&ev, &result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::VarId;
    use crate::constraint::{Relation, Term};
    use crate::field::PrimeField;

    #[test]
    fn test_horner_concrete() {
        let field = PrimeField::bn254();
        // 2x^2 + 3x + 5 at x = 4
        let coeffs = [field.from_i64(2), field.from_i64(3), field.from_i64(5)];
        let ev = horner(&field, &coeffs, &field.from_i64(4));
        assert_eq!(ev, field.from_i64(49));
    }

    #[test]
    fn test_horner_without_coefficients() {
        let field = PrimeField::bn254();
        assert_eq!(horner(&field, &[], &field.from_i64(9)), field.zero());
    }

    #[test]
    fn test_horner_wraps_modulus() {
        let field = PrimeField::bn254();
        let coeffs = [field.from_i64(-1), field.from_i64(-1)];
        // -x - 1 at x = 1 is -2
        assert_eq!(horner(&field, &coeffs, &field.one()), field.from_i64(-2));
    }

    #[test]
    fn test_encode_property_shape() {
        let field = PrimeField::bn254();
        let sym = Symbolic::new(&field);
        let interest = InterestVars::new(vec![
            (VarId(5), "result".into()),
            (VarId(2), "c0".into()),
            (VarId(4), "point".into()),
            (VarId(3), "c1".into()),
        ])
        .unwrap();

        let constraint = encode_property(&interest, &sym).unwrap();
        assert_eq!(constraint.origin, Origin::Property);

        match constraint.relation {
            Relation::NotEqual(ev, result) => {
                assert_eq!(result, Term::Var(VarId(5)));
                let values = [0i64, 1, 2, 3, 10, 0];
                let lookup = |id: VarId| values.get(id.index()).map(|v| field.from_i64(*v));
                // 2·10 + 3
                assert_eq!(ev.evaluate(&field, &lookup), Some(field.from_i64(23)));
            }
            other => panic!("unexpected relation {:?}", other),
        }
    }
}
