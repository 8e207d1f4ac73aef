//! Output table construction and serialization.
//!
//! Amounts leave the system as base-10 integer strings; floats never touch
//! the output path. `serde_json` is built with `preserve_order`, so the
//! sort order established here survives serialization.

use crate::domain::{Address, Amount, PoolRegistry};
use crate::engine::ledger::Ledger;
use crate::rewards::RewardLedger;
use serde_json::{Map, Value};
use std::path::Path;

/// Address -> reward string, sorted descending by reward. Zero-reward
/// entries are omitted.
pub fn reward_table(rewards: &RewardLedger) -> Value {
    let mut table = Map::new();
    for (address, amount) in rewards.sorted_desc() {
        if amount.is_zero() {
            continue;
        }
        table.insert(address.as_str().to_string(), Value::String(amount.to_base10()));
    }
    Value::Object(table)
}

/// Per-pool time-weighted exposure, each pool sorted descending.
pub fn time_weighted_by_pool(ledger: &Ledger, registry: &PoolRegistry) -> Value {
    let mut pools = Map::new();
    for spec in registry.iter() {
        let book = ledger.pool(spec.id);
        let mut entries: Vec<(&Address, Amount)> = book
            .holders
            .iter()
            .map(|(address, holder)| (address, holder.time_weighted))
            .collect();
        entries.sort_by(|(addr_a, amt_a), (addr_b, amt_b)| {
            amt_b.cmp(amt_a).then_with(|| addr_a.cmp(addr_b))
        });

        let mut table = Map::new();
        for (address, weighted) in entries {
            table.insert(address.as_str().to_string(), Value::String(weighted.to_base10()));
        }
        pools.insert(spec.symbol.clone(), Value::Object(table));
    }
    Value::Object(pools)
}

/// The same exposure data regrouped address-first, preserving each pool's
/// descending order within an address.
pub fn time_weighted_by_address(ledger: &Ledger, registry: &PoolRegistry) -> Value {
    let mut by_address: Map<String, Value> = Map::new();
    if let Value::Object(pools) = time_weighted_by_pool(ledger, registry) {
        for (pool, table) in pools {
            if let Value::Object(entries) = table {
                for (address, weighted) in entries {
                    let slot = by_address
                        .entry(address)
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(per_pool) = slot {
                        per_pool.insert(pool.clone(), weighted);
                    }
                }
            }
        }
    }
    Value::Object(by_address)
}

/// Pretty-print a table to disk.
pub fn write_json(path: impl AsRef<Path>, value: &Value) -> std::io::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    std::fs::write(path, rendered + "\n")
}
