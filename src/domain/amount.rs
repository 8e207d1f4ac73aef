//! Unsigned 256-bit fixed-point amount type.
//!
//! Token amounts follow an 18-decimal convention and USD prices a 2-decimal
//! tick convention; all monetary math stays in integers so replays reconcile
//! exactly. u128 is not wide enough for balance × price × quantum products,
//! hence the 256-bit backing.

use ethnum::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point token amount backed by an unsigned 256-bit integer.
///
/// Parses from and serializes to base-10 integer strings, never floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid amount string: {0:?}")]
pub struct AmountParseError(pub String);

impl Amount {
    /// The additive identity (0).
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub fn from_u128(value: u128) -> Self {
        Amount(U256::new(value))
    }

    pub fn from_u64(value: u64) -> Self {
        Amount(U256::new(value as u128))
    }

    /// Parse a non-negative base-10 integer string.
    pub fn from_base10(s: &str) -> Result<Self, AmountParseError> {
        U256::from_str_radix(s.trim(), 10)
            .map(Amount)
            .map_err(|_| AmountParseError(s.to_string()))
    }

    /// Format as a base-10 integer string.
    pub fn to_base10(&self) -> String {
        self.0.to_string()
    }

    /// 10^exp, for decimal-precision scaling. Panics if exp exceeds the
    /// 256-bit range; decimal tables cap out far below that.
    pub fn pow10(exp: u32) -> Self {
        Amount(U256::new(10).pow(exp))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn checked_mul(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_mul(rhs.0).map(Amount)
    }

    /// Truncating division. None if rhs is zero.
    pub fn checked_div(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_div(rhs.0).map(Amount)
    }

    /// Narrow to u128 if the value fits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0 > U256::new(u128::MAX) {
            None
        } else {
            Some(self.0.as_u128())
        }
    }

    /// Get the underlying U256.
    pub fn inner(&self) -> U256 {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base10(s)
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Amount(value)
    }
}

// Unchecked operator sugar for tests and provably bounded spots; monetary
// paths in the engine go through the checked methods.
impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base10())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_base10(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let cases = ["0", "1", "1000000000000000000", "120000000000000000000000000"];
        for s in cases {
            let a = Amount::from_base10(s).expect("parse failed");
            assert_eq!(a.to_base10(), s, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Amount::from_base10("").is_err());
        assert!(Amount::from_base10("-5").is_err());
        assert!(Amount::from_base10("1.5").is_err());
        assert!(Amount::from_base10("0x10").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_u128(10);
        let b = Amount::from_u128(3);
        assert_eq!(a.checked_add(b), Some(Amount::from_u128(13)));
        assert_eq!(a.checked_sub(b), Some(Amount::from_u128(7)));
        assert_eq!(a.checked_mul(b), Some(Amount::from_u128(30)));
        assert_eq!(a.checked_div(b), Some(Amount::from_u128(3)), "division truncates");
        assert_eq!(b.checked_sub(a), None, "underflow is surfaced, not wrapped");
        assert_eq!(a.checked_div(Amount::ZERO), None);
    }

    #[test]
    fn test_product_beyond_u128() {
        // balance (1e26) * price ticks (4e6) * quantum (2e20) overflows u128
        // but must stay exact here.
        let balance = Amount::from_base10("100000000000000000000000000").unwrap();
        let price = Amount::from_u128(4_000_000);
        let quantum = Amount::from_base10("200000000000000000000").unwrap();
        let product = balance
            .checked_mul(price)
            .and_then(|p| p.checked_mul(quantum))
            .unwrap();
        assert_eq!(
            product.to_base10(),
            "80000000000000000000000000000000000000000000000000000"
        );
        assert!(product.to_u128().is_none());
    }

    #[test]
    fn test_pow10() {
        assert_eq!(Amount::pow10(0), Amount::from_u128(1));
        assert_eq!(Amount::pow10(18).to_base10(), "1000000000000000000");
    }

    #[test]
    fn test_serde_as_string() {
        let a = Amount::from_base10("5000000000000000000000000").unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"5000000000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
