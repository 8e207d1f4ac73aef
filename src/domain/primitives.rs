//! Domain primitives: Timestamp, Address.

use serde::{Deserialize, Deserializer, Serialize};

/// Time in whole seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Create a Timestamp from unix seconds.
    pub fn new(secs: i64) -> Self {
        Timestamp(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Truncate to the start of the containing minute.
    ///
    /// Price series are keyed by this bucket: `ts - (ts mod 60)`.
    pub fn minute_floor(&self) -> Timestamp {
        Timestamp(self.0 - self.0.rem_euclid(60))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet or contract address (lowercased hex string).
///
/// Construction normalizes casing so set membership and map keys never
/// depend on how the source data happened to checksum the address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Address(String);

/// The zero address, used on-chain as the mint source and burn sink.
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

impl Address {
    /// Create an Address, normalizing to lowercase.
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into().to_ascii_lowercase())
    }

    /// The zero address.
    pub fn zero() -> Self {
        Address(ZERO_ADDRESS.to_string())
    }

    /// True if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Address::new)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
