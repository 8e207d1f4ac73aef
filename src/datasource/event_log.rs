//! Parsing the extracted LP-token transfer log.

use crate::domain::RawTransferLog;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a transfer log: a JSON array of rows, pre-sorted by block
/// ascending by the extraction query. Row order is preserved.
pub fn parse_event_log(reader: impl Read) -> Result<Vec<RawTransferLog>, EventLogError> {
    Ok(serde_json::from_reader(reader)?)
}
