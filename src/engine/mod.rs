//! Pure computation engines for deterministic distribution replay.

pub mod distribution;
pub mod ledger;
pub mod normalizer;
pub mod oracle;
pub mod swap_volume;
pub mod timestamp;
pub mod valuation;

pub use distribution::{distribute_step, DistributionError, RewardSchedule};
pub use ledger::{HolderState, Ledger, LedgerError, OverdraftPolicy, PoolBook};
pub use normalizer::{NormalizeError, Normalizer};
pub use oracle::{pool_price, OracleError, PriceSeries, PEGGED_UNIT_PRICE};
pub use swap_volume::{SwapSettings, SwapVolumeBook, SwapVolumeError};
pub use timestamp::{minute_bucket, parse_block_timestamp, StepClock, TimestampParseError};
pub use valuation::{value_step, StepValuation, ValuationError};
