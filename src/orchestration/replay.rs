//! The replay loops.
//!
//! Single-threaded and strictly ordered by step index: holder
//! time-weighting and balance invariants depend on seeing events in
//! chronological order, so ordering is a correctness requirement here, not
//! a performance choice. A fault mid-replay aborts the whole run; state is
//! cheap to recompute and a checkpoint with a bug baked in is not.

use crate::config::Campaign;
use crate::domain::{EventKind, SwapEvent, TransferEvent};
use crate::engine::distribution::distribute_step;
use crate::engine::ledger::Ledger;
use crate::engine::oracle::PriceSeries;
use crate::engine::swap_volume::{SwapSettings, SwapVolumeBook};
use crate::engine::valuation::value_step;
use crate::error::RunError;
use crate::rewards::{Reconciliation, RewardLedger};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Summary of one LP replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub steps: u64,
    pub events_applied: u64,
    pub events_out_of_range: u64,
    /// Burns clamped under the lenient overdraft policy.
    pub clamp_count: u64,
    pub reconciliation: Reconciliation,
}

/// Everything an LP replay produces.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub rewards: RewardLedger,
    pub ledger: Ledger,
    pub report: ReplayReport,
}

/// Replay the transfer log over the configured step range and apportion
/// the LP budget.
///
/// Per step: apply all mints, then all burns (a transfer contributes a
/// mint to its recipient and a burn from its sender, so a same-step
/// out-then-in between two addresses never trips a false overdraft), then
/// value the pools and distribute the step's quantum.
pub fn run_lp_replay(
    campaign: &Campaign,
    events: &[TransferEvent],
    prices: &PriceSeries,
) -> Result<ReplayOutcome, RunError> {
    let schedule = &campaign.schedule;

    let mut by_step: BTreeMap<u64, Vec<&TransferEvent>> = BTreeMap::new();
    let mut out_of_range = 0u64;
    for event in events {
        if event.block < schedule.start_step || event.block > schedule.end_step {
            out_of_range += 1;
            continue;
        }
        by_step.entry(event.block).or_default().push(event);
    }
    if out_of_range > 0 {
        warn!(
            count = out_of_range,
            "ignoring events outside the replay range"
        );
    }

    let mut ledger = Ledger::new(campaign.registry.len(), campaign.overdraft_policy);
    let mut rewards = RewardLedger::new();
    let mut events_applied = 0u64;
    // Finalization must not precede any applied event's timestamp.
    let mut finalize_ts = campaign.clock.estimate(schedule.end_step);

    for step in schedule.start_step..=schedule.end_step {
        if step % 10_000 == 0 {
            info!(step, "processing");
        }

        let ts = match by_step.get(&step) {
            Some(step_events) => {
                // Price lookups use the minute bucket of the step's first
                // event; ledger state records the events' own timestamps.
                let bucket = step_events[0].ts.minute_floor();

                for event in step_events.iter().filter(|e| e.kind == EventKind::Mint) {
                    ledger.apply_mint(event.pool, &event.to, event.amount, event.ts)?;
                }
                for event in step_events.iter().filter(|e| e.kind == EventKind::Transfer) {
                    ledger.apply_mint(event.pool, &event.to, event.amount, event.ts)?;
                }
                for event in step_events.iter().filter(|e| e.kind == EventKind::Burn) {
                    ledger.apply_burn(event.pool, &event.from, event.amount, event.ts)?;
                }
                for event in step_events.iter().filter(|e| e.kind == EventKind::Transfer) {
                    ledger.apply_burn(event.pool, &event.from, event.amount, event.ts)?;
                }

                events_applied += step_events.len() as u64;
                if let Some(last) = step_events.iter().map(|e| e.ts).max() {
                    finalize_ts = finalize_ts.max(last);
                }
                bucket
            }
            // No events: extrapolate a timestamp for the price lookup only.
            None => campaign.clock.estimate(step),
        };

        let valuation = value_step(&ledger, &campaign.registry, prices, &campaign.metapools, ts)?;
        distribute_step(
            &ledger,
            &campaign.registry,
            &valuation,
            schedule.quantum_at(step),
            &campaign.metapool_addresses,
            &mut rewards,
        )?;
    }

    ledger.finalize_time_weights(finalize_ts)?;

    let reconciliation = Reconciliation::check(schedule.budget, &rewards);
    reconciliation.surface("lp");
    if ledger.clamp_count() > 0 {
        warn!(
            clamps = ledger.clamp_count(),
            "burns were clamped to zero during the replay"
        );
    }

    let report = ReplayReport {
        steps: schedule.end_step - schedule.start_step + 1,
        events_applied,
        events_out_of_range: out_of_range,
        clamp_count: ledger.clamp_count(),
        reconciliation,
    };
    Ok(ReplayOutcome {
        rewards,
        ledger,
        report,
    })
}

/// Everything a swap distribution produces.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub rewards: RewardLedger,
    pub volumes: SwapVolumeBook,
    pub eligible: usize,
    pub reconciliation: Reconciliation,
}

/// Replay the swap log and split the swap budget across eligible wallets.
pub fn run_swap_distribution(
    campaign: &Campaign,
    settings: &SwapSettings,
    swaps: &[SwapEvent],
    prices: &PriceSeries,
) -> Result<SwapOutcome, RunError> {
    let mut volumes = SwapVolumeBook::new();
    for event in swaps {
        volumes.apply(event, &campaign.registry, prices)?;
    }
    info!(
        swappers = volumes.iter().count(),
        total_volume_ticks = volumes.total_volume(),
        "swap volume accounted"
    );

    let (rewards, eligible) = volumes.distribute(settings)?;
    let reconciliation = Reconciliation::check(settings.budget, &rewards);
    reconciliation.surface("swap");

    Ok(SwapOutcome {
        rewards,
        volumes,
        eligible,
        reconciliation,
    })
}

impl ReplayOutcome {
    /// Distinct holder-pool pairs observed during the replay.
    pub fn holder_count(&self) -> usize {
        self.ledger
            .iter_pools()
            .map(|(_, book)| book.holders.len())
            .sum()
    }
}
