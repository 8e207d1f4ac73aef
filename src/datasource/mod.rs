//! Parsing of the extracted input artifacts.
//!
//! Every parser takes a reader and never touches the filesystem itself, so
//! the formats are testable in isolation; `main` owns file I/O.

pub mod event_log;
pub mod prices;
pub mod swap_log;

pub use event_log::{parse_event_log, EventLogError};
pub use prices::{parse_price_series, PriceSeriesError};
pub use swap_log::{parse_swap_log, SwapLogError};
