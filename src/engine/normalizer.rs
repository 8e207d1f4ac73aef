//! Raw log rows to canonical events.

use crate::domain::{
    Address, Amount, AmountParseError, EventKind, PoolRegistry, RawSwapLog, RawTransferLog,
    SwapEvent, TransferEvent, UnknownPoolError,
};
use crate::engine::timestamp::{parse_block_timestamp, TimestampParseError};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    UnknownPool(#[from] UnknownPoolError),
    #[error("bad amount in log row: {0}")]
    Amount(#[from] AmountParseError),
    #[error(transparent)]
    Timestamp(#[from] TimestampParseError),
}

/// Maps raw log rows to canonical events.
///
/// Resolution failures are fatal by design: an address missing from the
/// pool table means the table is incomplete, and dropping the row would
/// silently skew the distribution.
pub struct Normalizer<'a> {
    registry: &'a PoolRegistry,
    /// Staking/auto-compounder contracts. Movements touching these are
    /// internal protocol plumbing, not end-user position changes.
    excluded: &'a HashSet<Address>,
}

impl<'a> Normalizer<'a> {
    pub fn new(registry: &'a PoolRegistry, excluded: &'a HashSet<Address>) -> Self {
        Normalizer { registry, excluded }
    }

    /// Normalize one transfer-log row.
    ///
    /// Returns `Ok(None)` for rows that produce no event: zero amounts
    /// (skipped before they can touch `last_action_ts`) and excluded
    /// holder-to-holder transfers. Mints and burns are never filtered by
    /// the exclusion set; supply changes are real even when a staking
    /// contract is the counterparty.
    pub fn normalize(&self, raw: &RawTransferLog) -> Result<Option<TransferEvent>, NormalizeError> {
        let pool = self.registry.resolve(&raw.pool)?;
        let amount = Amount::from_base10(&raw.amount)?;
        if amount.is_zero() {
            return Ok(None);
        }

        let kind = if raw.address_from.is_zero() {
            EventKind::Mint
        } else if raw.address_to.is_zero() {
            EventKind::Burn
        } else {
            EventKind::Transfer
        };

        if kind == EventKind::Transfer
            && (self.excluded.contains(&raw.address_from) || self.excluded.contains(&raw.address_to))
        {
            debug!(
                from = %raw.address_from,
                to = %raw.address_to,
                "skipping internal transfer"
            );
            return Ok(None);
        }

        let ts = parse_block_timestamp(&raw.block_timestamp)?;
        Ok(Some(TransferEvent {
            pool,
            block: raw.block_number,
            ts,
            from: raw.address_from.clone(),
            to: raw.address_to.clone(),
            amount,
            kind,
        }))
    }

    /// Normalize a full transfer log, preserving input order.
    pub fn normalize_all(
        &self,
        rows: &[RawTransferLog],
    ) -> Result<Vec<TransferEvent>, NormalizeError> {
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(event) = self.normalize(row)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Normalize one swap-log row. Zero-size swaps produce no event.
    pub fn normalize_swap(&self, raw: &RawSwapLog) -> Result<Option<SwapEvent>, NormalizeError> {
        let pool = self.registry.resolve(&raw.pool)?;
        let tokens_sold = Amount::from_base10(&raw.tokens_sold)?;
        if tokens_sold.is_zero() {
            return Ok(None);
        }
        let ts = parse_block_timestamp(&raw.block_timestamp)?;
        Ok(Some(SwapEvent {
            pool,
            ts,
            buyer: raw.buyer.clone(),
            tokens_sold,
            sold_id: raw.sold_id,
        }))
    }

    /// Normalize a full swap log, preserving input order.
    pub fn normalize_swaps(&self, rows: &[RawSwapLog]) -> Result<Vec<SwapEvent>, NormalizeError> {
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(event) = self.normalize_swap(row)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}
