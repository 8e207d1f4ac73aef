//! Per-pool holder balance and time-weighted exposure accounting.
//!
//! The ledger is a per-(pool, holder) state machine over mint and burn
//! operations. Callers must feed operations in chronological order; within
//! one step all mints apply before all burns (the replay loop owns that
//! ordering). Holder maps are ordered so a replay of the same log is
//! byte-identical.

use crate::domain::{Address, Amount, PoolId, Timestamp};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Per-holder position in one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderState {
    /// Current LP-token balance. Never negative.
    pub balance: Amount,
    /// Time of the last balance-affecting event.
    pub last_action_ts: Timestamp,
    /// First time this holder was observed in this pool.
    pub first_observed_ts: Timestamp,
    /// Balance integrated over holding duration: Σ balance × Δt.
    pub time_weighted: Amount,
}

/// How burn overdrafts are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdraftPolicy {
    /// Abort the run with full context.
    Strict,
    /// Clamp the balance to zero, count the clamp, and keep going. Covers
    /// event logs with missing upstream mint records.
    ClampAndCount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("burn of {amount} exceeds balance {balance} for {address} in pool {pool:?}")]
    InsufficientBalance {
        pool: PoolId,
        address: Address,
        amount: Amount,
        balance: Amount,
    },
    /// Input ordering violation: an event's timestamp precedes the holder's
    /// last action. The time-weighted accumulator cannot absorb negative
    /// durations.
    #[error("event at {ts} precedes last action {last} for {address} in pool {pool:?}")]
    TimestampRegression {
        pool: PoolId,
        address: Address,
        ts: Timestamp,
        last: Timestamp,
    },
    #[error("amount overflow updating {address} in pool {pool:?}")]
    Overflow { pool: PoolId, address: Address },
}

/// All holder state for one pool, with the incrementally maintained total.
#[derive(Debug, Clone, Default)]
pub struct PoolBook {
    pub total_locked: Amount,
    pub holders: BTreeMap<Address, HolderState>,
}

impl PoolBook {
    /// Re-sum holder balances from scratch. Cross-check for the
    /// incrementally tracked `total_locked` (balance-conservation law).
    pub fn recomputed_total(&self) -> Amount {
        self.holders
            .values()
            .fold(Amount::ZERO, |acc, h| acc + h.balance)
    }
}

/// The per-pool holder state machine.
#[derive(Debug, Clone)]
pub struct Ledger {
    pools: Vec<PoolBook>,
    policy: OverdraftPolicy,
    clamp_count: u64,
}

impl Ledger {
    pub fn new(pool_count: usize, policy: OverdraftPolicy) -> Self {
        Ledger {
            pools: vec![PoolBook::default(); pool_count],
            policy,
            clamp_count: 0,
        }
    }

    pub fn pool(&self, id: PoolId) -> &PoolBook {
        &self.pools[id.index()]
    }

    /// Balance of `address` in `pool`, zero if never observed.
    pub fn balance_of(&self, pool: PoolId, address: &Address) -> Amount {
        self.pools[pool.index()]
            .holders
            .get(address)
            .map(|h| h.balance)
            .unwrap_or(Amount::ZERO)
    }

    /// Number of burns clamped under `OverdraftPolicy::ClampAndCount`.
    pub fn clamp_count(&self) -> u64 {
        self.clamp_count
    }

    pub fn iter_pools(&self) -> impl Iterator<Item = (PoolId, &PoolBook)> {
        self.pools
            .iter()
            .enumerate()
            .map(|(i, book)| (PoolId(i as u16), book))
    }

    /// Apply a mint: credit `amount` to `to` at `ts`.
    pub fn apply_mint(
        &mut self,
        pool: PoolId,
        to: &Address,
        amount: Amount,
        ts: Timestamp,
    ) -> Result<(), LedgerError> {
        let book = &mut self.pools[pool.index()];
        match book.holders.get_mut(to) {
            Some(holder) => {
                accrue_exposure(holder, pool, to, ts)?;
                holder.balance = holder
                    .balance
                    .checked_add(amount)
                    .ok_or_else(|| overflow(pool, to))?;
                holder.last_action_ts = ts;
            }
            None => {
                book.holders.insert(
                    to.clone(),
                    HolderState {
                        balance: amount,
                        last_action_ts: ts,
                        first_observed_ts: ts,
                        time_weighted: Amount::ZERO,
                    },
                );
            }
        }
        book.total_locked = book
            .total_locked
            .checked_add(amount)
            .ok_or_else(|| overflow(pool, to))?;
        Ok(())
    }

    /// Apply a burn: debit `amount` from `from` at `ts`.
    ///
    /// An overdraft is a data-integrity fault: either an unresolved prior
    /// mint or a gap in the extracted log. Strict mode aborts; lenient mode
    /// clamps to zero and counts the clamp so it stays auditable.
    pub fn apply_burn(
        &mut self,
        pool: PoolId,
        from: &Address,
        amount: Amount,
        ts: Timestamp,
    ) -> Result<(), LedgerError> {
        let book = &mut self.pools[pool.index()];
        let holder = book.holders.entry(from.clone()).or_insert(HolderState {
            balance: Amount::ZERO,
            last_action_ts: ts,
            first_observed_ts: ts,
            time_weighted: Amount::ZERO,
        });
        accrue_exposure(holder, pool, from, ts)?;

        let debit = match holder.balance.checked_sub(amount) {
            Some(_) => amount,
            None => match self.policy {
                OverdraftPolicy::Strict => {
                    return Err(LedgerError::InsufficientBalance {
                        pool,
                        address: from.clone(),
                        amount,
                        balance: holder.balance,
                    });
                }
                OverdraftPolicy::ClampAndCount => {
                    warn!(
                        pool = pool.0,
                        address = %from,
                        amount = %amount,
                        balance = %holder.balance,
                        "burn exceeds balance, clamping to zero"
                    );
                    self.clamp_count += 1;
                    holder.balance
                }
            },
        };

        holder.balance = holder.balance - debit;
        holder.last_action_ts = ts;
        book.total_locked = book
            .total_locked
            .checked_sub(debit)
            .ok_or_else(|| overflow(pool, from))?;
        Ok(())
    }

    /// Close out every holder's time-weighted accumulator at `end_ts`.
    ///
    /// Runs once after the replay; holders untouched since their last event
    /// get credit for the final stretch of the range.
    pub fn finalize_time_weights(&mut self, end_ts: Timestamp) -> Result<(), LedgerError> {
        for (index, book) in self.pools.iter_mut().enumerate() {
            let pool = PoolId(index as u16);
            for (address, holder) in book.holders.iter_mut() {
                accrue_exposure(holder, pool, address, end_ts)?;
                holder.last_action_ts = end_ts;
            }
        }
        Ok(())
    }
}

/// Fold `balance × (ts - last_action_ts)` into the holder's accumulator.
/// Called before every balance change so the old balance earns its full
/// duration.
fn accrue_exposure(
    holder: &mut HolderState,
    pool: PoolId,
    address: &Address,
    ts: Timestamp,
) -> Result<(), LedgerError> {
    let elapsed = ts.as_secs() - holder.last_action_ts.as_secs();
    if elapsed < 0 {
        return Err(LedgerError::TimestampRegression {
            pool,
            address: address.clone(),
            ts,
            last: holder.last_action_ts,
        });
    }
    let weighted = holder
        .balance
        .checked_mul(Amount::from_u128(elapsed as u128))
        .ok_or_else(|| overflow(pool, address))?;
    holder.time_weighted = holder
        .time_weighted
        .checked_add(weighted)
        .ok_or_else(|| overflow(pool, address))?;
    Ok(())
}

fn overflow(pool: PoolId, address: &Address) -> LedgerError {
    LedgerError::Overflow {
        pool,
        address: address.clone(),
    }
}
