//! Field literal decoding and formatting
//!
//! Circuit descriptions carry every field value as text. Two formats exist:
//! - Decimal strings: "12345" or "-1" (arbitrary precision using BigInt)
//! - Hexadecimal: "0x1a2b" or "1a2b" (any size, prefix optional)
//!
//! The circuit dumper this tool consumes writes bare hexadecimal, so hex
//! without a prefix must be requested explicitly with [`ValueEncoding::Hex`];
//! [`ValueEncoding::Auto`] only treats `0x`-prefixed literals as hex.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Num, Zero};

use crate::error::EncodingError;

/// Literal encoding format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    /// Hex when prefixed with 0x, decimal otherwise
    Auto,

    /// Decimal string: "12345"
    Decimal,

    /// Hexadecimal with or without 0x prefix: "0x1a2b" or "1a2b"
    Hex,
}

impl ValueEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueEncoding::Auto => "auto",
            ValueEncoding::Decimal => "decimal",
            ValueEncoding::Hex => "hex",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ValueEncoding::Auto => "0x-prefixed literals are hex, everything else decimal",
            ValueEncoding::Decimal => "All literals are decimal",
            ValueEncoding::Hex => "All literals are hexadecimal (prefix optional)",
        }
    }
}

impl Default for ValueEncoding {
    fn default() -> Self {
        ValueEncoding::Auto
    }
}

impl fmt::Display for ValueEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValueEncoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ValueEncoding::Auto),
            "decimal" | "dec" => Ok(ValueEncoding::Decimal),
            "hex" => Ok(ValueEncoding::Hex),
            _ => Err(EncodingError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Parse a signed integer literal according to the specified encoding
///
/// A leading `-` is accepted in every encoding. Reduction into the field is
/// the caller's job; this function only decodes text.
///
/// # Examples
///
/// ```ignore
/// let v = parse_integer("12345", ValueEncoding::Decimal)?;
/// let v = parse_integer("0x1a2b", ValueEncoding::Auto)?;
/// let v = parse_integer("1a2b", ValueEncoding::Hex)?;
/// let v = parse_integer("-1", ValueEncoding::Auto)?;
/// ```
pub fn parse_integer(value: &str, encoding: ValueEncoding) -> Result<BigInt, EncodingError> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let has_prefix = body.starts_with("0x") || body.starts_with("0X");
    let magnitude = match encoding {
        ValueEncoding::Hex => parse_hex(body, value)?,
        ValueEncoding::Auto if has_prefix => parse_hex(body, value)?,
        ValueEncoding::Auto | ValueEncoding::Decimal => parse_decimal(body, value)?,
    };

    let sign = if negative && !magnitude.is_zero() {
        Sign::Minus
    } else {
        Sign::Plus
    };
    Ok(BigInt::from_biguint(sign, magnitude))
}

fn parse_decimal(body: &str, original: &str) -> Result<BigUint, EncodingError> {
    // from_str_radix accepts a leading '+', which is not a circuit literal
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(EncodingError::InvalidDecimal {
            context: String::new(),
            literal: original.to_string(),
        });
    }

    BigUint::from_str_radix(body, 10).map_err(|_| EncodingError::InvalidDecimal {
        context: String::new(),
        literal: original.to_string(),
    })
}

fn parse_hex(body: &str, original: &str) -> Result<BigUint, EncodingError> {
    let invalid = || EncodingError::InvalidHex {
        context: String::new(),
        literal: original.to_string(),
    };

    // Remove 0x prefix if present
    let hex_str = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .unwrap_or(body);

    if hex_str.is_empty() {
        return Err(invalid());
    }

    // hex::decode wants whole bytes
    let bytes = if hex_str.len() % 2 == 1 {
        hex::decode(format!("0{}", hex_str))
    } else {
        hex::decode(hex_str)
    }
    .map_err(|_| invalid())?;

    Ok(BigUint::from_bytes_be(&bytes))
}

/// Convert a non-negative integer to decimal string representation
pub fn to_decimal(value: &BigUint) -> String {
    value.to_str_radix(10)
}

/// Convert a non-negative integer to hex string (with 0x prefix, minimal digits)
pub fn to_hex(value: &BigUint) -> String {
    if value.is_zero() {
        return "0x0".to_string();
    }
    let encoded = hex::encode(value.to_bytes_be());
    format!("0x{}", encoded.trim_start_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        let result = parse_integer("12345", ValueEncoding::Decimal).unwrap();
        assert_eq!(result, BigInt::from(12345));
    }

    #[test]
    fn test_parse_negative_decimal() {
        let result = parse_integer("-17", ValueEncoding::Auto).unwrap();
        assert_eq!(result, BigInt::from(-17));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let result = parse_integer("-0", ValueEncoding::Decimal).unwrap();
        assert!(result.is_zero());
        assert_eq!(result.sign(), Sign::NoSign);
    }

    #[test]
    fn test_parse_hex_with_prefix() {
        let result = parse_integer("0x1a2b", ValueEncoding::Hex).unwrap();
        assert_eq!(result, BigInt::from(0x1a2b));
    }

    #[test]
    fn test_parse_hex_without_prefix() {
        let result = parse_integer("1a2b", ValueEncoding::Hex).unwrap();
        assert_eq!(result, BigInt::from(0x1a2b));
    }

    #[test]
    fn test_parse_odd_length_hex() {
        let result = parse_integer("f", ValueEncoding::Hex).unwrap();
        assert_eq!(result, BigInt::from(15));

        let result = parse_integer("0x123", ValueEncoding::Auto).unwrap();
        assert_eq!(result, BigInt::from(0x123));
    }

    #[test]
    fn test_auto_detect() {
        assert_eq!(parse_integer("0x10", ValueEncoding::Auto).unwrap(), BigInt::from(16));
        assert_eq!(parse_integer("10", ValueEncoding::Auto).unwrap(), BigInt::from(10));
        assert_eq!(parse_integer("-0x10", ValueEncoding::Auto).unwrap(), BigInt::from(-16));
    }

    #[test]
    fn test_bare_hex_rejected_as_decimal() {
        assert!(matches!(
            parse_integer("1a2b", ValueEncoding::Auto),
            Err(EncodingError::InvalidDecimal { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_integer("", ValueEncoding::Decimal).is_err());
        assert!(parse_integer("-", ValueEncoding::Decimal).is_err());
        assert!(parse_integer("12.34", ValueEncoding::Decimal).is_err());
        assert!(parse_integer("+5", ValueEncoding::Decimal).is_err());
        assert!(parse_integer(" 5", ValueEncoding::Decimal).is_err());
        assert!(parse_integer("0x", ValueEncoding::Hex).is_err());
        assert!(parse_integer("0xzz", ValueEncoding::Auto).is_err());
    }

    #[test]
    fn test_large_decimal_numbers() {
        // Test with number larger than u64::MAX (18446744073709551615)
        let large_number = "99999999999999999999999999999999";
        let value = parse_integer(large_number, ValueEncoding::Decimal).unwrap();
        assert_eq!(value.to_string(), large_number);
    }

    #[test]
    fn test_format_helpers() {
        let value = BigUint::from(0x1a2bu32);
        assert_eq!(to_decimal(&value), "6699");
        assert_eq!(to_hex(&value), "0x1a2b");
        assert_eq!(to_hex(&BigUint::from(0u32)), "0x0");
        assert_eq!(to_hex(&BigUint::from(0xfu32)), "0xf");
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("HEX".parse::<ValueEncoding>().unwrap(), ValueEncoding::Hex);
        assert_eq!("dec".parse::<ValueEncoding>().unwrap(), ValueEncoding::Decimal);
        assert!("base58".parse::<ValueEncoding>().is_err());
    }
}
