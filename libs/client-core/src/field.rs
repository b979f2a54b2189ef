//! Prime field arithmetic
//!
//! Elements of the BN254 scalar field, the field shared by the Poseidon
//! commitment hash and the Baby Jubjub curve coordinates. Values are kept
//! fully reduced: every `FieldElement` is strictly below [`modulus`].

use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

static MODULUS: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
        10,
    )
    .expect("field modulus literal")
});

/// The field prime `p`.
pub fn modulus() -> &'static BigUint {
    &MODULUS
}

/// Field construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("value {0} is not below the field modulus")]
    OutOfRange(String),

    #[error("malformed field element: {0}")]
    Malformed(String),
}

/// An element of the scalar field, always reduced.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(BigUint::one())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    /// Accept a value only if it is already a canonical field element.
    pub fn new(value: BigUint) -> Result<Self, FieldError> {
        if value >= *MODULUS {
            return Err(FieldError::OutOfRange(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Reduce an arbitrary integer into the field.
    pub fn reduce(value: &BigUint) -> Self {
        Self(value % &*MODULUS)
    }

    /// Interpret big-endian bytes as an integer and reduce.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self::reduce(&BigUint::from_bytes_be(bytes))
    }

    pub fn from_le_bytes_mod_order(bytes: &[u8]) -> Self {
        Self::reduce(&BigUint::from_bytes_le(bytes))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// 32-byte little-endian encoding.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut out = self.to_be_bytes();
        out.reverse();
        out
    }

    pub fn square(&self) -> Self {
        self * self
    }

    /// `self^5`, the Poseidon S-box.
    pub fn pow5(&self) -> Self {
        let sq = self.square();
        &sq.square() * self
    }

    pub fn pow(&self, exponent: &BigUint) -> Self {
        Self(self.0.modpow(exponent, &MODULUS))
    }

    /// Multiplicative inverse via Fermat; `None` for zero.
    pub fn inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let exponent = &*MODULUS - BigUint::from(2u32);
        Some(self.pow(&exponent))
    }
}

impl<'a> Add<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'a FieldElement) -> FieldElement {
        let mut sum = &self.0 + &rhs.0;
        if sum >= *MODULUS {
            sum -= &*MODULUS;
        }
        FieldElement(sum)
    }
}

impl<'a> Sub<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'a FieldElement) -> FieldElement {
        if self.0 >= rhs.0 {
            FieldElement(&self.0 - &rhs.0)
        } else {
            FieldElement(&*MODULUS - &rhs.0 + &self.0)
        }
    }
}

impl<'a> Mul<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'a FieldElement) -> FieldElement {
        FieldElement((&self.0 * &rhs.0) % &*MODULUS)
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        &FieldElement::zero() - self
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<bool> for FieldElement {
    fn from(flag: bool) -> Self {
        Self::from_u64(u64::from(flag))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    /// Parse a decimal integer string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigUint::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| FieldError::Malformed(s.to_string()))?;
        Self::new(value)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p_minus(n: u64) -> FieldElement {
        FieldElement::new(modulus() - BigUint::from(n)).unwrap()
    }

    #[test]
    fn test_add_wraps() {
        let a = p_minus(1);
        assert_eq!(&a + &FieldElement::from_u64(2), FieldElement::one());
    }

    #[test]
    fn test_sub_wraps() {
        let r = &FieldElement::from_u64(1) - &FieldElement::from_u64(2);
        assert_eq!(r, p_minus(1));
    }

    #[test]
    fn test_neg() {
        assert_eq!(-&FieldElement::from_u64(5), p_minus(5));
        assert_eq!(-&FieldElement::zero(), FieldElement::zero());
    }

    #[test]
    fn test_inverse() {
        let a = FieldElement::from_u64(168_700);
        let inv = a.inverse().unwrap();
        assert_eq!(&a * &inv, FieldElement::one());
        assert!(FieldElement::zero().inverse().is_none());
    }

    #[test]
    fn test_pow5() {
        assert_eq!(FieldElement::from_u64(3).pow5(), FieldElement::from_u64(243));
    }

    #[test]
    fn test_new_rejects_modulus() {
        assert!(FieldElement::new(modulus().clone()).is_err());
    }

    #[test]
    fn test_decimal_roundtrip_and_serde() {
        let a: FieldElement = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(a.to_string(), "123456789012345678901234567890");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"123456789012345678901234567890\"");
        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn test_be_bytes_padding() {
        let bytes = FieldElement::from_u64(0x0102).to_be_bytes();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
        let le = FieldElement::from_u64(0x0102).to_le_bytes();
        assert_eq!(&le[..2], &[0x02, 0x01]);
        assert_eq!(FieldElement::from_le_bytes_mod_order(&le), FieldElement::from_u64(0x0102));
    }
}
