//! Raw log rows and the canonical events the engine replays.

use crate::domain::{Address, Amount, PoolId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the extracted LP-token transfer log, as exported.
///
/// `block_number` arrives as a JSON number in some exports and a string in
/// others; both are accepted. `pool` carries either the pool symbol or the
/// LP-token address depending on the export query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransferLog {
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub block_number: u64,
    pub block_timestamp: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    pub address_from: Address,
    pub address_to: Address,
    pub amount: String,
    pub pool: String,
}

/// One row of the extracted swap log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSwapLog {
    pub pool: String,
    pub block_timestamp: String,
    pub buyer: Address,
    #[serde(rename = "tokensSold")]
    pub tokens_sold: String,
    #[serde(rename = "soldId", deserialize_with = "u64_from_number_or_string")]
    pub sold_id: u64,
}

/// Event classification against the zero address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Transfer from the zero address: new LP-token issuance (a deposit).
    Mint,
    /// Transfer to the zero address: LP-token redemption (a withdrawal).
    Burn,
    /// Holder-to-holder movement; replayed as a mint to the recipient and a
    /// burn from the sender within the same step.
    Transfer,
}

/// Canonical pool event after normalization. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub pool: PoolId,
    pub block: u64,
    pub ts: Timestamp,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub kind: EventKind,
}

/// Canonical swap event after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEvent {
    pub pool: PoolId,
    pub ts: Timestamp,
    pub buyer: Address,
    pub tokens_sold: Amount,
    /// Index into the pool's asset-decimals table for the sold token.
    pub sold_id: u64,
}

fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_row_with_numeric_block() {
        let row: RawTransferLog = serde_json::from_str(
            r#"{
                "block_number": 11686727,
                "block_timestamp": "2021-01-19T14:44:32Z",
                "transaction_hash": "0xabc",
                "address_from": "0x0000000000000000000000000000000000000000",
                "address_to": "0x1111111111111111111111111111111111111111",
                "amount": "1000000000000000000",
                "pool": "BTC"
            }"#,
        )
        .unwrap();
        assert_eq!(row.block_number, 11686727);
        assert!(row.address_from.is_zero());
    }

    #[test]
    fn test_transfer_row_with_string_block() {
        let row: RawTransferLog = serde_json::from_str(
            r#"{
                "block_number": "11686727",
                "block_timestamp": "2021-01-19T14:44:32Z",
                "address_from": "0x0000000000000000000000000000000000000000",
                "address_to": "0x1111111111111111111111111111111111111111",
                "amount": "5",
                "pool": "USD"
            }"#,
        )
        .unwrap();
        assert_eq!(row.block_number, 11686727);
        assert!(row.transaction_hash.is_none());
    }

    #[test]
    fn test_swap_row_field_names() {
        let row: RawSwapLog = serde_json::from_str(
            r#"{
                "pool": "0x4f6a43ad7cba042606decaca730d4ce0a57ac62e",
                "block_timestamp": "2021-02-01T00:00:30Z",
                "buyer": "0x2222222222222222222222222222222222222222",
                "tokensSold": "150000000",
                "soldId": "1"
            }"#,
        )
        .unwrap();
        assert_eq!(row.sold_id, 1);
        assert_eq!(row.tokens_sold, "150000000");
    }
}
