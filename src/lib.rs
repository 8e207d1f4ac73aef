pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod output;
pub mod rewards;

pub use config::{Campaign, Paths};
pub use domain::{Address, Amount, PoolId, Timestamp};
pub use engine::{Ledger, Normalizer, OverdraftPolicy, PriceSeries, RewardSchedule};
pub use error::RunError;
pub use rewards::{Reconciliation, RewardLedger};
