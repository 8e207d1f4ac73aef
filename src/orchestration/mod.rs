//! Run orchestration: the strictly ordered replay loops.

pub mod replay;

pub use replay::{run_lp_replay, run_swap_distribution, ReplayOutcome, ReplayReport, SwapOutcome};
