//! Per-step reward apportionment.

use crate::domain::{Address, Amount, PoolRegistry};
use crate::engine::ledger::Ledger;
use crate::engine::valuation::StepValuation;
use crate::rewards::RewardLedger;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributionError {
    #[error("reward overflow for {0}")]
    Overflow(Address),
}

/// Reward emission schedule over the replay range.
///
/// The per-step quantum is fixed, and doubled for steps inside the guarded
/// launch window: participation there ran under constrained access, so the
/// window counts twice toward effective duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSchedule {
    pub start_step: u64,
    pub end_step: u64,
    pub guarded_launch_end_step: u64,
    /// Total budget in 18-decimal base units.
    pub budget: Amount,
    /// Base quantum per step, in base units.
    pub tokens_per_step: Amount,
}

impl RewardSchedule {
    /// Derive the per-step quantum from a total budget.
    ///
    /// Guarded steps count twice, so `budget = tokens_per_step ×
    /// effective_steps` up to division truncation.
    pub fn from_budget(
        start_step: u64,
        end_step: u64,
        guarded_launch_end_step: u64,
        budget: Amount,
    ) -> Self {
        let schedule = RewardSchedule {
            start_step,
            end_step,
            guarded_launch_end_step,
            budget,
            tokens_per_step: Amount::ZERO,
        };
        let effective = schedule.effective_steps();
        let tokens_per_step = budget
            .checked_div(Amount::from_u128(effective as u128))
            .unwrap_or(Amount::ZERO);
        RewardSchedule {
            tokens_per_step,
            ..schedule
        }
    }

    /// Steps in the replay range, with guarded steps counted twice.
    pub fn effective_steps(&self) -> u64 {
        let steps = self.end_step - self.start_step + 1;
        steps + self.guarded_steps()
    }

    /// Steps in range that fall inside the guarded launch window.
    pub fn guarded_steps(&self) -> u64 {
        self.guarded_launch_end_step
            .saturating_sub(self.start_step)
            .min(self.end_step - self.start_step + 1)
    }

    /// The reward quantum for one step.
    pub fn quantum_at(&self, step: u64) -> Amount {
        if step < self.guarded_launch_end_step {
            self.tokens_per_step + self.tokens_per_step
        } else {
            self.tokens_per_step
        }
    }
}

/// Apportion one step's quantum across all holders, pro-rata by USD value.
///
/// `holder_reward = balance × pool_price × quantum ÷ total_usd`, truncating.
/// Zero-TVL steps distribute nothing (their quantum surfaces later as a
/// reconciliation shortfall). Addresses in `excluded` (metapool contracts)
/// accrue nothing; their underlying value was already removed from
/// `total_usd` by the valuation correction.
pub fn distribute_step(
    ledger: &Ledger,
    registry: &PoolRegistry,
    valuation: &StepValuation,
    quantum: Amount,
    excluded: &HashSet<Address>,
    rewards: &mut RewardLedger,
) -> Result<(), DistributionError> {
    if valuation.total_usd.is_zero() || quantum.is_zero() {
        return Ok(());
    }

    for spec in registry.iter() {
        let price = Amount::from_u64(valuation.price(spec.id));
        for (address, holder) in &ledger.pool(spec.id).holders {
            if holder.balance.is_zero() || excluded.contains(address) {
                continue;
            }
            let reward = holder
                .balance
                .checked_mul(price)
                .and_then(|v| v.checked_mul(quantum))
                .and_then(|v| v.checked_div(valuation.total_usd))
                .ok_or_else(|| DistributionError::Overflow(address.clone()))?;
            rewards
                .accrue(address, reward)
                .map_err(|_| DistributionError::Overflow(address.clone()))?;
        }
    }
    Ok(())
}
