//! Minute-granularity USD price lookups.

use crate::domain::{PoolSpec, Pricing, Timestamp};
use std::collections::HashMap;
use thiserror::Error;

/// Unit price for USD-pegged pools: $1.00 in 2-decimal ticks.
pub const PEGGED_UNIT_PRICE: u64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    /// The series has no entry for this asset at this minute bucket. Fatal:
    /// the replay range requires a complete series.
    #[error("no {asset} price at minute bucket {ts}")]
    MissingPrice { asset: String, ts: i64 },
}

/// In-memory price table keyed by (asset, minute-aligned timestamp).
///
/// Prices are integer 2-decimal USD ticks. The series is sparse; lookups
/// always use exact minute buckets, so callers truncate first.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    by_asset: HashMap<String, HashMap<i64, u64>>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price tick. Later rows for the same bucket win, matching
    /// the line-by-line materialization of the source CSV.
    pub fn insert(&mut self, asset: &str, ts: Timestamp, ticks: u64) {
        self.by_asset
            .entry(asset.to_string())
            .or_default()
            .insert(ts.as_secs(), ticks);
    }

    /// Price of `asset` at an exact minute bucket.
    pub fn price_at(&self, asset: &str, ts: Timestamp) -> Result<u64, OracleError> {
        self.by_asset
            .get(asset)
            .and_then(|series| series.get(&ts.as_secs()))
            .copied()
            .ok_or_else(|| OracleError::MissingPrice {
                asset: asset.to_string(),
                ts: ts.as_secs(),
            })
    }

    pub fn len(&self) -> usize {
        self.by_asset.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_asset.is_empty()
    }
}

/// USD price of one unit of `pool`'s representative asset at `ts`.
///
/// USD-pegged pools never touch the series.
pub fn pool_price(series: &PriceSeries, pool: &PoolSpec, ts: Timestamp) -> Result<u64, OracleError> {
    match &pool.pricing {
        Pricing::Pegged => Ok(PEGGED_UNIT_PRICE),
        Pricing::Oracle(asset) => series.price_at(asset, ts),
    }
}
