//! Top-level error taxonomy.
//!
//! Everything here is fatal to the run: this is an offline deterministic
//! batch, so there are no transient-failure classes and no retries. A
//! reconciliation mismatch is deliberately NOT an error; it is a diagnostic
//! carried in the run report (see `rewards::Reconciliation`).

use crate::config::ConfigError;
use crate::datasource::{EventLogError, PriceSeriesError, SwapLogError};
use crate::engine::distribution::DistributionError;
use crate::engine::ledger::LedgerError;
use crate::engine::normalizer::NormalizeError;
use crate::engine::swap_volume::SwapVolumeError;
use crate::engine::valuation::ValuationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("event log: {0}")]
    EventLog(#[from] EventLogError),
    #[error("price series: {0}")]
    Prices(#[from] PriceSeriesError),
    #[error("swap log: {0}")]
    SwapLog(#[from] SwapLogError),
    #[error("normalization: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("valuation: {0}")]
    Valuation(#[from] ValuationError),
    #[error("distribution: {0}")]
    Distribution(#[from] DistributionError),
    #[error("swap volume: {0}")]
    SwapVolume(#[from] SwapVolumeError),
}
