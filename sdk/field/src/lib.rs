//! Field Elements
//!
//! Every number that reaches a circuit (values, salts, keys, commitments) is an
//! element of the BN254 scalar field:
//!
//! ```text
//! r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
//! ```
//!
//! `FieldElement` is the only way numbers enter the commitment and proving code.
//! Construction from external representations is modulus-checked: a value `>= r`
//! is rejected rather than silently reduced, so two different wire values can
//! never collapse onto the same element.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// BN254 scalar field modulus as a big integer
static MODULUS: LazyLock<BigUint> = LazyLock::new(|| Fr::MODULUS.into());

/// Errors raised while constructing a field element.
///
/// Messages describe the failure only; the rejected value is never echoed back
/// since it may be a salt or a key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid field element: {0}")]
    InvalidFieldElement(&'static str),
}

pub type Result<T> = std::result::Result<T, FieldError>;

/// An element of the BN254 scalar field in canonical (reduced) form
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub const ZERO: Self = Self(Fr::ZERO);

    /// Wrap an arkworks field element (already reduced by construction)
    pub fn new(inner: Fr) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> Fr {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Fr::ZERO
    }

    /// The field modulus `r`
    pub fn modulus() -> &'static BigUint {
        &MODULUS
    }

    /// Build from an arbitrary-precision integer, rejecting anything `>= r`
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value >= &*MODULUS {
            return Err(FieldError::InvalidFieldElement(
                "value is not below the field modulus",
            ));
        }
        Ok(Self(Fr::from_le_bytes_mod_order(&value.to_bytes_le())))
    }

    /// Parse a base-10 integer string (digits only, no sign)
    pub fn from_decimal(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidFieldElement(
                "expected a non-negative decimal integer",
            ));
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10).ok_or(
            FieldError::InvalidFieldElement("expected a non-negative decimal integer"),
        )?;
        Self::from_biguint(&value)
    }

    /// Parse a `0x`-prefixed hexadecimal string
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .ok_or(FieldError::InvalidFieldElement("expected a 0x-prefixed hex string"))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FieldError::InvalidFieldElement("malformed hex string"));
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or(FieldError::InvalidFieldElement("malformed hex string"))?;
        Self::from_biguint(&value)
    }

    /// Decode a 32-byte big-endian integer
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self> {
        Self::from_biguint(&BigUint::from_bytes_be(bytes))
    }

    /// Canonical 32-byte big-endian encoding
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    pub fn to_biguint(&self) -> BigUint {
        self.0.into_bigint().into()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:064x}", self.to_biguint())
    }

    /// The element as a `u64`, if it fits
    pub fn to_u64(&self) -> Option<u64> {
        let limbs = self.0.into_bigint().0;
        limbs[1..].iter().all(|l| *l == 0).then_some(limbs[0])
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl From<Fr> for FieldElement {
    fn from(inner: Fr) -> Self {
        Self(inner)
    }
}

impl From<FieldElement> for Fr {
    fn from(fe: FieldElement) -> Self {
        fe.0
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("0x") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_biguint())
    }
}

// ============================================================================
// Serde (decimal strings on the wire)
// ============================================================================

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct FieldElementVisitor;

impl Visitor<'_> for FieldElementVisitor {
    type Value = FieldElement;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal or 0x-hex string, or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FieldElement, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FieldElement, E> {
        Ok(FieldElement::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FieldElement, E> {
        u64::try_from(v)
            .map(FieldElement::from)
            .map_err(|_| E::custom("invalid field element: negative integer"))
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(FieldElementVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MODULUS_DEC: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";

    #[test]
    fn test_modulus_is_rejected() {
        let err = FieldElement::from_decimal(MODULUS_DEC).unwrap_err();
        assert!(matches!(err, FieldError::InvalidFieldElement(_)));
    }

    #[test]
    fn test_modulus_minus_one_is_accepted() {
        let max = FieldElement::modulus() - 1u32;
        let fe = FieldElement::from_biguint(&max).unwrap();
        assert_eq!(fe.to_biguint(), max);
        assert_eq!(fe.inner() + Fr::from(1u64), FieldElement::ZERO.inner());
    }

    #[test]
    fn test_rejects_non_numeric() {
        for bad in ["", "-1", "1.5", "+7", "abc", "0x", "0xzz"] {
            assert!(bad.parse::<FieldElement>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_decimal_and_hex_agree() {
        let a: FieldElement = "255".parse().unwrap();
        let b: FieldElement = "0xff".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "255");
        assert_eq!(a.to_u64(), Some(255));
    }

    #[test]
    fn test_to_u64_overflow() {
        let big = FieldElement::from_decimal("18446744073709551616").unwrap(); // 2^64
        assert_eq!(big.to_u64(), None);
    }

    #[test]
    fn test_serde_decimal_string() {
        let fe = FieldElement::from(42);
        let json = serde_json::to_string(&fe).unwrap();
        assert_eq!(json, "\"42\"");

        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fe);

        let from_number: FieldElement = serde_json::from_str("42").unwrap();
        assert_eq!(from_number, fe);

        assert!(serde_json::from_str::<FieldElement>("-3").is_err());
        assert!(serde_json::from_str::<FieldElement>(&format!("\"{MODULUS_DEC}\"")).is_err());
    }

    #[test]
    fn test_oversized_bytes_rejected() {
        assert!(FieldElement::from_be_bytes(&[0xff; 32]).is_err());
    }

    proptest! {
        #[test]
        fn prop_be_bytes_round_trip(seed in any::<[u64; 4]>()) {
            let mut limbs = seed;
            limbs[3] &= 0x0fff_ffff_ffff_ffff; // stay below r
            let fe = FieldElement::new(Fr::from_bigint(ark_ff::BigInt::new(limbs)).unwrap());
            prop_assert_eq!(FieldElement::from_be_bytes(&fe.to_be_bytes()).unwrap(), fe);
            prop_assert_eq!(FieldElement::from_decimal(&fe.to_string()).unwrap(), fe);
        }
    }
}
