//! Domain types for deterministic distribution replay.
//!
//! This module provides:
//! - Lossless 256-bit fixed-point amounts via the Amount wrapper
//! - Domain primitives: Timestamp, Address
//! - Pool identity (PoolId) and the registry that issues it
//! - Raw log rows and canonical normalized events

pub mod amount;
pub mod event;
pub mod pool;
pub mod primitives;

pub use amount::{Amount, AmountParseError};
pub use event::{EventKind, RawSwapLog, RawTransferLog, SwapEvent, TransferEvent};
pub use pool::{PoolId, PoolRegistry, PoolSpec, Pricing, UnknownPoolError};
pub use primitives::{Address, Timestamp};
