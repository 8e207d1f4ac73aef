//! Value-weighted swap accounting.
//!
//! Swaps are replayed one logical event at a time: each sold leg is valued
//! in USD at the swap's minute bucket, volume accumulates per buyer, and
//! the swap budget splits evenly across addresses that clear the volume
//! threshold.

use crate::domain::{Address, Amount, PoolRegistry, SwapEvent};
use crate::engine::oracle::{pool_price, OracleError, PriceSeries};
use crate::rewards::RewardLedger;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwapVolumeError {
    /// The pool's decimal-precision table has no entry for this token
    /// index. Fatal: the static table is incomplete.
    #[error("no decimal precision for token {sold_id} of pool {pool}")]
    MissingDecimals { pool: String, sold_id: u64 },
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("swap volume overflow for {0}")]
    Overflow(Address),
}

/// Swap-reward eligibility and budget parameters.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    /// Budget in 18-decimal base units.
    pub budget: Amount,
    /// Cumulative volume must strictly exceed this (2-decimal USD ticks).
    pub min_volume_ticks: u128,
    /// Addresses barred from swap rewards regardless of volume.
    pub blocklist: HashSet<Address>,
}

/// Per-buyer cumulative USD swap volume, in 2-decimal ticks.
#[derive(Debug, Clone, Default)]
pub struct SwapVolumeBook {
    volumes: BTreeMap<Address, u128>,
    total: u128,
}

impl SwapVolumeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value one swap's sold leg and add it to the buyer's running volume.
    ///
    /// `ticks = tokens_sold × asset_price ÷ 10^decimals`, truncating, where
    /// `decimals` comes from the pool's per-asset precision table.
    pub fn apply(
        &mut self,
        event: &SwapEvent,
        registry: &PoolRegistry,
        prices: &PriceSeries,
    ) -> Result<(), SwapVolumeError> {
        let spec = registry.spec(event.pool);
        let decimals = *spec
            .asset_decimals
            .get(event.sold_id as usize)
            .ok_or_else(|| SwapVolumeError::MissingDecimals {
                pool: spec.symbol.clone(),
                sold_id: event.sold_id,
            })?;
        let price = pool_price(prices, spec, event.ts.minute_floor())?;

        let ticks = event
            .tokens_sold
            .checked_mul(Amount::from_u64(price))
            .and_then(|v| v.checked_div(Amount::pow10(decimals)))
            .and_then(|v| v.to_u128())
            .ok_or_else(|| SwapVolumeError::Overflow(event.buyer.clone()))?;

        let entry = self.volumes.entry(event.buyer.clone()).or_insert(0);
        *entry = entry
            .checked_add(ticks)
            .ok_or_else(|| SwapVolumeError::Overflow(event.buyer.clone()))?;
        self.total = self
            .total
            .checked_add(ticks)
            .ok_or_else(|| SwapVolumeError::Overflow(event.buyer.clone()))?;
        Ok(())
    }

    pub fn volume_of(&self, address: &Address) -> u128 {
        self.volumes.get(address).copied().unwrap_or(0)
    }

    /// Total USD volume across all buyers, in ticks.
    pub fn total_volume(&self) -> u128 {
        self.total
    }

    /// Buyers in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, u128)> {
        self.volumes.iter().map(|(a, v)| (a, *v))
    }

    /// Addresses clearing the threshold and not on the blocklist.
    pub fn eligible(&self, settings: &SwapSettings) -> Vec<&Address> {
        self.volumes
            .iter()
            .filter(|&(address, &volume)| {
                volume > settings.min_volume_ticks && !settings.blocklist.contains(address)
            })
            .map(|(address, _)| address)
            .collect()
    }

    /// Split the swap budget evenly (truncating) across eligible buyers.
    ///
    /// Returns the reward table and the count of eligible wallets; with
    /// zero eligible wallets the table is empty and the whole budget shows
    /// up as reconciliation shortfall.
    pub fn distribute(
        &self,
        settings: &SwapSettings,
    ) -> Result<(RewardLedger, usize), SwapVolumeError> {
        let eligible = self.eligible(settings);
        let mut rewards = RewardLedger::new();
        if eligible.is_empty() {
            return Ok((rewards, 0));
        }

        let per_address = settings
            .budget
            .checked_div(Amount::from_u128(eligible.len() as u128))
            .unwrap_or(Amount::ZERO);
        for address in &eligible {
            rewards
                .accrue(address, per_address)
                .map_err(|e| SwapVolumeError::Overflow(e.0))?;
        }
        info!(
            eligible = eligible.len(),
            per_address = %per_address,
            "swap rewards split evenly across eligible wallets"
        );
        Ok((rewards, eligible.len()))
    }
}
