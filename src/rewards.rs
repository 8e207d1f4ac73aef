//! Accumulated reward balances, merging, and budget reconciliation.

use crate::domain::{Address, Amount};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("reward accumulator overflow for {0}")]
pub struct RewardOverflowError(pub Address);

/// Address -> accumulated reward, 18-decimal base units.
///
/// Grows monotonically during a replay; finalized once and never mutated
/// afterward. Ordered by address so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardLedger {
    balances: BTreeMap<Address, Amount>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `address`'s accumulated reward.
    pub fn accrue(&mut self, address: &Address, amount: Amount) -> Result<(), RewardOverflowError> {
        if amount.is_zero() {
            return Ok(());
        }
        let entry = self.balances.entry(address.clone()).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| RewardOverflowError(address.clone()))?;
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    /// Sum of all accumulated rewards.
    pub fn total(&self) -> Amount {
        self.balances.values().fold(Amount::ZERO, |acc, v| acc + *v)
    }

    /// Entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.balances.iter().map(|(a, v)| (a, *v))
    }

    /// Entries sorted descending by reward, ties broken by address.
    pub fn sorted_desc(&self) -> Vec<(&Address, Amount)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(addr_a, amt_a), (addr_b, amt_b)| {
            amt_b.cmp(amt_a).then_with(|| addr_a.cmp(addr_b))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum several independently computed reward tables address-wise.
    pub fn merge<'a>(tables: impl IntoIterator<Item = &'a RewardLedger>) -> Result<RewardLedger, RewardOverflowError> {
        let mut merged = RewardLedger::new();
        for table in tables {
            for (address, amount) in table.iter() {
                merged.accrue(address, amount)?;
            }
        }
        Ok(merged)
    }
}

/// Outcome of comparing a distributed total against the configured budget.
///
/// A mismatch is a diagnostic, not a recoverable error: the output is still
/// produced, and the exact discrepancy is surfaced for audit. Repeated
/// truncating division leaves a bounded shortfall of at most one base unit
/// per (step, holder-pool) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub expected: Amount,
    pub distributed: Amount,
}

impl Reconciliation {
    pub fn check(expected: Amount, rewards: &RewardLedger) -> Self {
        Reconciliation {
            expected,
            distributed: rewards.total(),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.expected == self.distributed
    }

    /// Budget not paid out due to truncation (or skipped zero-TVL steps).
    pub fn shortfall(&self) -> Amount {
        self.expected
            .checked_sub(self.distributed)
            .unwrap_or(Amount::ZERO)
    }

    /// Overpayment, which would indicate a real accounting bug.
    pub fn excess(&self) -> Amount {
        self.distributed
            .checked_sub(self.expected)
            .unwrap_or(Amount::ZERO)
    }

    /// Log the outcome. Mismatches go to `error!` so they cannot scroll by
    /// unnoticed in a long replay log.
    pub fn surface(&self, label: &str) {
        if self.is_exact() {
            info!(label, total = %self.distributed, "distribution reconciles exactly");
        } else {
            error!(
                label,
                expected = %self.expected,
                distributed = %self.distributed,
                shortfall = %self.shortfall(),
                excess = %self.excess(),
                "distribution does not reconcile against the configured budget"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::new(format!("0x{:040x}", tag))
    }

    fn amt(v: u128) -> Amount {
        Amount::from_u128(v)
    }

    #[test]
    fn test_accrue_accumulates() {
        let mut ledger = RewardLedger::new();
        ledger.accrue(&addr(1), amt(10)).unwrap();
        ledger.accrue(&addr(1), amt(5)).unwrap();
        assert_eq!(ledger.get(&addr(1)), amt(15));
        assert_eq!(ledger.total(), amt(15));
    }

    #[test]
    fn test_zero_accruals_create_no_entries() {
        let mut ledger = RewardLedger::new();
        ledger.accrue(&addr(1), Amount::ZERO).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_sorted_desc_with_address_tiebreak() {
        let mut ledger = RewardLedger::new();
        ledger.accrue(&addr(3), amt(5)).unwrap();
        ledger.accrue(&addr(1), amt(20)).unwrap();
        ledger.accrue(&addr(2), amt(5)).unwrap();

        let sorted = ledger.sorted_desc();
        assert_eq!(sorted[0], (&addr(1), amt(20)));
        assert_eq!(sorted[1], (&addr(2), amt(5)));
        assert_eq!(sorted[2], (&addr(3), amt(5)));
    }

    #[test]
    fn test_merge_sums_addresswise() {
        let mut a = RewardLedger::new();
        a.accrue(&addr(1), amt(10)).unwrap();
        a.accrue(&addr(2), amt(20)).unwrap();
        let mut b = RewardLedger::new();
        b.accrue(&addr(2), amt(5)).unwrap();
        b.accrue(&addr(3), amt(7)).unwrap();

        let merged = RewardLedger::merge([&a, &b]).unwrap();
        assert_eq!(merged.get(&addr(1)), amt(10));
        assert_eq!(merged.get(&addr(2)), amt(25));
        assert_eq!(merged.get(&addr(3)), amt(7));
        assert_eq!(merged.total(), a.total() + b.total());
    }

    #[test]
    fn test_reconciliation_exact() {
        let mut ledger = RewardLedger::new();
        ledger.accrue(&addr(1), amt(100)).unwrap();
        let rec = Reconciliation::check(amt(100), &ledger);
        assert!(rec.is_exact());
        assert_eq!(rec.shortfall(), Amount::ZERO);
        assert_eq!(rec.excess(), Amount::ZERO);
    }

    #[test]
    fn test_reconciliation_shortfall() {
        let mut ledger = RewardLedger::new();
        ledger.accrue(&addr(1), amt(97)).unwrap();
        let rec = Reconciliation::check(amt(100), &ledger);
        assert!(!rec.is_exact());
        assert_eq!(rec.shortfall(), amt(3));
        assert_eq!(rec.excess(), Amount::ZERO);
    }
}
