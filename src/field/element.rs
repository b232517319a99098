//! Prime field and canonical field elements
//!
//! All arithmetic is modulo a fixed prime `p`; every value handed out by
//! [`PrimeField`] is the canonical residue in `[0, p-1]`.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::encoding::{parse_integer, to_decimal, ValueEncoding};
use crate::error::EncodingError;

/// Scalar field modulus of BN254 (the curve barretenberg circuits are built over)
pub const BN254_SCALAR_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416722356417445781525470495617";

/// Canonical field element: an integer in `[0, p-1]`
///
/// Only [`PrimeField`] constructs these, so the range invariant holds for
/// the field that created it. The default is zero, which is canonical in
/// every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The canonical residue
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_bigint(&self) -> BigInt {
        BigInt::from_biguint(Sign::Plus, self.0.clone())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_decimal(&self.0))
    }
}

impl Serialize for FieldElement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_decimal(&self.0))
    }
}

/// How field constants are written when handed to a solver
///
/// Every residue has two natural integer representatives. `Canonical` uses
/// `x` itself; `Signed` uses `x - p` for `x > (p-1)/2`, so `p-1` becomes `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignConvention {
    /// Non-negative residue in [0, p-1]
    Canonical,
    /// Residues above (p-1)/2 written as negative integers
    Signed,
}

impl SignConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignConvention::Canonical => "canonical",
            SignConvention::Signed => "signed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignConvention::Canonical => "Constants written as non-negative residues in [0, p-1]",
            SignConvention::Signed => "Constants above (p-1)/2 written as negative integers",
        }
    }
}

impl Default for SignConvention {
    fn default() -> Self {
        SignConvention::Canonical
    }
}

impl fmt::Display for SignConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "canonical" => Ok(SignConvention::Canonical),
            "signed" => Ok(SignConvention::Signed),
            _ => Err(format!(
                "Invalid sign convention '{}'. Valid conventions: canonical, signed",
                s
            )),
        }
    }
}

/// Integers modulo a fixed prime
#[derive(Debug, Clone)]
pub struct PrimeField {
    modulus: BigUint,
    modulus_signed: BigInt,
    half: BigUint,
}

impl PrimeField {
    /// Create a field over `modulus`. Primality is the caller's responsibility.
    pub fn new(modulus: BigUint) -> Self {
        let half = (&modulus - BigUint::one()) >> 1usize;
        let modulus_signed = BigInt::from_biguint(Sign::Plus, modulus.clone());
        Self {
            modulus,
            modulus_signed,
            half,
        }
    }

    /// The BN254 scalar field
    pub fn bn254() -> Self {
        let modulus = BigUint::parse_bytes(BN254_SCALAR_MODULUS.as_bytes(), 10)
            .unwrap_or_else(|| unreachable!("modulus constant is a decimal literal"));
        Self::new(modulus)
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn zero(&self) -> FieldElement {
        FieldElement(BigUint::zero())
    }

    pub fn one(&self) -> FieldElement {
        FieldElement(BigUint::one())
    }

    /// Wrap a residue, rejecting values `>= p`
    pub fn element(&self, value: BigUint) -> Result<FieldElement, EncodingError> {
        if value >= self.modulus {
            return Err(EncodingError::OutOfField {
                context: String::new(),
                literal: value.to_string(),
            });
        }
        Ok(FieldElement(value))
    }

    /// Build a constant from a signed integer; negatives get `p` added
    pub fn from_i64(&self, value: i64) -> FieldElement {
        self.normalize(&BigInt::from(value))
    }

    /// Strict conversion: `|value|` must be below `p`, negatives map to `value + p`
    pub fn from_bigint(&self, value: &BigInt) -> Result<FieldElement, EncodingError> {
        if value.magnitude() >= &self.modulus {
            return Err(EncodingError::OutOfField {
                context: String::new(),
                literal: value.to_string(),
            });
        }
        Ok(self.normalize(value))
    }

    /// Parse a decimal/hex literal (optionally negative) into a field constant
    pub fn parse(&self, literal: &str, encoding: ValueEncoding) -> Result<FieldElement, EncodingError> {
        let value = parse_integer(literal, encoding)?;
        self.from_bigint(&value).map_err(|_| EncodingError::OutOfField {
            context: String::new(),
            literal: literal.to_string(),
        })
    }

    /// Map any integer representative (negative, or `>= p`) to its canonical residue
    ///
    /// Idempotent on values already in `[0, p-1]`.
    pub fn normalize(&self, value: &BigInt) -> FieldElement {
        let reduced = value.mod_floor(&self.modulus_signed);
        // mod_floor with a positive modulus is never negative
        FieldElement(reduced.magnitude().clone())
    }

    /// Integer representative of `x` under the given convention
    pub fn represent(&self, x: &FieldElement, convention: SignConvention) -> BigInt {
        match convention {
            SignConvention::Canonical => x.to_bigint(),
            SignConvention::Signed => self.signed(x),
        }
    }

    /// `x - p` when `x > (p-1)/2`, else `x`
    pub fn signed(&self, x: &FieldElement) -> BigInt {
        if x.0 > self.half {
            x.to_bigint() - &self.modulus_signed
        } else {
            x.to_bigint()
        }
    }

    pub fn add(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        let mut sum = &a.0 + &b.0;
        if sum >= self.modulus {
            sum -= &self.modulus;
        }
        FieldElement(sum)
    }

    pub fn sub(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        if a.0 >= b.0 {
            FieldElement(&a.0 - &b.0)
        } else {
            FieldElement(&self.modulus - (&b.0 - &a.0))
        }
    }

    pub fn mul(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        FieldElement((&a.0 * &b.0) % &self.modulus)
    }

    pub fn neg(&self, a: &FieldElement) -> FieldElement {
        if a.0.is_zero() {
            a.clone()
        } else {
            FieldElement(&self.modulus - &a.0)
        }
    }

    pub fn pow(&self, base: &FieldElement, exponent: &BigUint) -> FieldElement {
        FieldElement(base.0.modpow(exponent, &self.modulus))
    }

    /// Multiplicative inverse via Fermat's little theorem; `None` for zero
    pub fn inv(&self, a: &FieldElement) -> Option<FieldElement> {
        if a.0.is_zero() {
            return None;
        }
        let exponent = &self.modulus - BigUint::from(2u32);
        Some(self.pow(a, &exponent))
    }

    /// Whether `value` already lies in `[0, p-1]`
    pub fn is_canonical(&self, value: &BigInt) -> bool {
        !value.is_negative() && value.magnitude() < &self.modulus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_field() -> PrimeField {
        PrimeField::new(BigUint::from(97u32))
    }

    #[test]
    fn test_bn254_modulus_hex() {
        let field = PrimeField::bn254();
        assert_eq!(
            field.modulus().to_str_radix(16),
            "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001"
        );
    }

    #[test]
    fn test_from_i64_negative() {
        let field = small_field();
        assert_eq!(field.from_i64(-1).value(), &BigUint::from(96u32));
        assert_eq!(field.from_i64(-97).value(), &BigUint::from(0u32));
        assert_eq!(field.from_i64(5).value(), &BigUint::from(5u32));
    }

    #[test]
    fn test_element_is_strict() {
        let field = small_field();
        assert_eq!(field.element(BigUint::from(96u32)).unwrap(), field.from_i64(-1));
        assert!(matches!(
            field.element(BigUint::from(97u32)),
            Err(EncodingError::OutOfField { .. })
        ));
        assert!(field.is_canonical(&BigInt::from(96)));
        assert!(!field.is_canonical(&BigInt::from(97)));
        assert!(!field.is_canonical(&BigInt::from(-1)));
    }

    #[test]
    fn test_from_bigint_rejects_out_of_field() {
        let field = small_field();
        assert!(field.from_bigint(&BigInt::from(97)).is_err());
        assert!(field.from_bigint(&BigInt::from(-97)).is_err());
        assert_eq!(field.from_bigint(&BigInt::from(-96)).unwrap(), field.one());
    }

    #[test]
    fn test_parse_literals() {
        let field = PrimeField::bn254();
        let minus_one = field.parse("-1", ValueEncoding::Auto).unwrap();
        assert_eq!(minus_one, field.neg(&field.one()));

        let hex = field
            .parse(
                "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000000",
                ValueEncoding::Hex,
            )
            .unwrap();
        assert_eq!(hex, minus_one);

        let modulus = field.parse(BN254_SCALAR_MODULUS, ValueEncoding::Decimal);
        assert!(matches!(modulus, Err(EncodingError::OutOfField { .. })));
    }

    #[test]
    fn test_normalize_idempotent_and_negative() {
        let field = PrimeField::bn254();
        let x = BigInt::from(123456789u64);
        assert_eq!(field.normalize(&x).to_bigint(), x);

        let negative = BigInt::from(-5);
        let expected = BigInt::from_biguint(Sign::Plus, field.modulus().clone()) - 5;
        assert_eq!(field.normalize(&negative).to_bigint(), expected);
    }

    #[test]
    fn test_signed_representation() {
        let field = small_field();
        // (p-1)/2 = 48 stays positive, 49 flips
        assert_eq!(field.signed(&field.from_i64(48)), BigInt::from(48));
        assert_eq!(field.signed(&field.from_i64(49)), BigInt::from(-48));
        assert_eq!(field.represent(&field.from_i64(-1), SignConvention::Signed), BigInt::from(-1));
        assert_eq!(field.represent(&field.from_i64(-1), SignConvention::Canonical), BigInt::from(96));
    }

    #[test]
    fn test_inverse() {
        let field = small_field();
        assert!(field.inv(&field.zero()).is_none());
        let three = field.from_i64(3);
        let inv = field.inv(&three).unwrap();
        assert_eq!(field.mul(&three, &inv), field.one());
    }

    #[test]
    fn test_sign_convention_from_str() {
        assert_eq!("Signed".parse::<SignConvention>().unwrap(), SignConvention::Signed);
        assert!("twos".parse::<SignConvention>().is_err());
    }

    proptest! {
        #[test]
        fn prop_results_are_reduced(a in any::<i64>(), b in any::<i64>()) {
            let field = PrimeField::bn254();
            let (x, y) = (field.from_i64(a), field.from_i64(b));
            for r in [field.add(&x, &y), field.mul(&x, &y), field.neg(&x), field.sub(&x, &y)] {
                prop_assert!(r.value() < field.modulus());
            }
        }

        #[test]
        fn prop_matches_integer_arithmetic(a in any::<i64>(), b in any::<i64>()) {
            let field = PrimeField::bn254();
            let (x, y) = (field.from_i64(a), field.from_i64(b));
            let sum = BigInt::from(a) + BigInt::from(b);
            let product = BigInt::from(a) * BigInt::from(b);
            prop_assert_eq!(field.add(&x, &y), field.normalize(&sum));
            prop_assert_eq!(field.mul(&x, &y), field.normalize(&product));
            prop_assert_eq!(field.sub(&x, &y), field.normalize(&(BigInt::from(a) - BigInt::from(b))));
        }

        #[test]
        fn prop_neg_is_additive_inverse(a in any::<i64>()) {
            let field = PrimeField::bn254();
            let x = field.from_i64(a);
            prop_assert_eq!(field.add(&x, &field.neg(&x)), field.zero());
        }

        #[test]
        fn prop_signed_roundtrip(a in any::<i64>()) {
            let field = PrimeField::bn254();
            let x = field.from_i64(a);
            prop_assert_eq!(field.signed(&x), BigInt::from(a));
            prop_assert_eq!(field.normalize(&field.signed(&x)), x);
        }
    }
}
