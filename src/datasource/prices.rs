//! Parsing the minute-granularity price series.
//!
//! The series is headerless CSV, one `timestamp,price,asset` record per
//! line, fully materialized into a lookup table before the replay starts.

use crate::domain::Timestamp;
use crate::engine::oracle::PriceSeries;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceSeriesError {
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid price {price:?} for {asset} at {ts}")]
    InvalidPrice {
        ts: i64,
        asset: String,
        price: String,
    },
}

/// Parse a price CSV into a minute-bucketed series.
///
/// Prices are decimal strings with at most 2 fractional digits and become
/// integer ticks exactly; anything finer would silently lose precision, so
/// it is rejected instead.
pub fn parse_price_series(reader: impl Read) -> Result<PriceSeries, PriceSeriesError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut series = PriceSeries::new();
    for record in csv_reader.deserialize::<(i64, String, String)>() {
        let (ts, price, asset) = record?;
        let ticks = price_to_ticks(&price).ok_or_else(|| PriceSeriesError::InvalidPrice {
            ts,
            asset: asset.clone(),
            price: price.clone(),
        })?;
        series.insert(asset.trim(), Timestamp::new(ts).minute_floor(), ticks);
    }
    Ok(series)
}

/// "34505.17" -> 3450517. None for negatives, sub-tick precision, or
/// values outside u64.
fn price_to_ticks(price: &str) -> Option<u64> {
    let parsed = Decimal::from_str(price.trim()).ok()?;
    if parsed.is_sign_negative() {
        return None;
    }
    let ticks = parsed.checked_mul(Decimal::ONE_HUNDRED)?;
    if ticks.fract() != Decimal::ZERO {
        return None;
    }
    ticks.to_u64()
}
