//! Pool identity and the registry that issues it.
//!
//! Pool identity is resolved exactly once, at the configuration boundary.
//! Everything downstream carries a dense copyable `PoolId`; a typo in input
//! data cannot silently open a phantom pool bucket, it fails resolution.

use crate::domain::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Dense pool index issued by `PoolRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub u16);

impl PoolId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// How a pool's LP token is valued in USD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pricing {
    /// USD-pegged: fixed unit price of 100 ticks ($1.00).
    Pegged,
    /// Priced from the oracle series for the named asset.
    Oracle(String),
}

/// Static description of one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSpec {
    pub id: PoolId,
    pub symbol: String,
    pub lp_token: Address,
    pub pricing: Pricing,
    /// Decimal precision of each constituent asset, indexed by token id.
    /// Used when valuing swap legs.
    pub asset_decimals: Vec<u32>,
}

/// Raised when input data references a pool the address table doesn't know.
///
/// This aborts the run: it means the static mapping is incomplete, and
/// skipping would silently drop volume from the distribution.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown pool identifier {0:?} (incomplete address table)")]
pub struct UnknownPoolError(pub String);

/// Address/symbol -> PoolId lookup table built from configuration.
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    pools: Vec<PoolSpec>,
    by_address: HashMap<Address, PoolId>,
    by_symbol: HashMap<String, PoolId>,
}

impl PoolRegistry {
    /// Build a registry from pool specs. Ids must be dense and in order;
    /// `config` is responsible for issuing them that way.
    pub fn new(pools: Vec<PoolSpec>) -> Self {
        let mut by_address = HashMap::new();
        let mut by_symbol = HashMap::new();
        for spec in &pools {
            by_address.insert(spec.lp_token.clone(), spec.id);
            by_symbol.insert(spec.symbol.clone(), spec.id);
        }
        PoolRegistry {
            pools,
            by_address,
            by_symbol,
        }
    }

    /// Resolve a raw pool identifier: an LP-token address or a pool symbol.
    ///
    /// Extracted logs carry the symbol in some exports and the pool address
    /// in others, so both are accepted.
    pub fn resolve(&self, raw: &str) -> Result<PoolId, UnknownPoolError> {
        if let Some(id) = self.by_address.get(&Address::new(raw)) {
            return Ok(*id);
        }
        if let Some(id) = self.by_symbol.get(raw) {
            return Ok(*id);
        }
        Err(UnknownPoolError(raw.to_string()))
    }

    /// Resolve a pool symbol only (used for config cross-references).
    pub fn resolve_symbol(&self, symbol: &str) -> Option<PoolId> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn spec(&self, id: PoolId) -> &PoolSpec {
        &self.pools[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolSpec> {
        self.pools.iter()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PoolRegistry {
        PoolRegistry::new(vec![
            PoolSpec {
                id: PoolId(0),
                symbol: "BTC".to_string(),
                lp_token: Address::new("0x4f6a43ad7cba042606decaca730d4ce0a57ac62e"),
                pricing: Pricing::Oracle("BTC".to_string()),
                asset_decimals: vec![18, 8, 8, 18],
            },
            PoolSpec {
                id: PoolId(1),
                symbol: "USD".to_string(),
                lp_token: Address::new("0x3911f80530595fbd01ab1516ab61255d75aeb066"),
                pricing: Pricing::Pegged,
                asset_decimals: vec![18, 6, 6],
            },
        ])
    }

    #[test]
    fn test_resolve_by_address_case_insensitive() {
        let r = registry();
        assert_eq!(
            r.resolve("0x4F6A43AD7CBA042606DECACA730D4CE0A57AC62E").unwrap(),
            PoolId(0)
        );
    }

    #[test]
    fn test_resolve_by_symbol() {
        let r = registry();
        assert_eq!(r.resolve("USD").unwrap(), PoolId(1));
    }

    #[test]
    fn test_unknown_pool_is_an_error() {
        let r = registry();
        let err = r.resolve("0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef").unwrap_err();
        assert!(err.to_string().contains("unknown pool"));
    }

    #[test]
    fn test_spec_lookup() {
        let r = registry();
        let id = r.resolve("BTC").unwrap();
        assert_eq!(r.spec(id).asset_decimals, vec![18, 8, 8, 18]);
    }
}
