//! Parsing the extracted swap log.

use crate::domain::RawSwapLog;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapLogError {
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a swap log: a JSON array of rows, in execution order.
pub fn parse_swap_log(reader: impl Read) -> Result<Vec<RawSwapLog>, SwapLogError> {
    Ok(serde_json::from_reader(reader)?)
}
