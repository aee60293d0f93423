//! Derived statistics: run summary and progress snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::null_as_default;

/// Summary statistics over the accumulated record set.
///
/// Legacy responses supply this object directly and may omit the stock
/// counters; absent or `null` fields read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSummary {
    /// Number of qualifying records.
    #[serde(deserialize_with = "null_as_default")]
    pub total_count: u64,
    /// Arithmetic mean of `change_pct`.
    #[serde(deserialize_with = "null_as_default")]
    pub avg_change_pct: Decimal,
    /// Arithmetic mean of `volume`.
    #[serde(deserialize_with = "null_as_default")]
    pub avg_volume: Decimal,
    /// Sum of `market_cap`.
    #[serde(deserialize_with = "null_as_default")]
    pub total_market_cap: Decimal,
    /// Stocks processed so far by the server.
    #[serde(deserialize_with = "null_as_default")]
    pub processed_stocks: u64,
    /// Total stocks the server intends to process.
    #[serde(deserialize_with = "null_as_default")]
    pub total_stocks: u64,
}

/// Progress indicator shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Integer percentage in `0..=100`.
    pub percentage: u8,
    /// Informational message; never drives control flow.
    pub message: String,
}

impl ProgressSnapshot {
    /// Build a snapshot.
    pub fn new(percentage: u8, message: impl Into<String>) -> Self {
        Self {
            percentage: percentage.min(100),
            message: message.into(),
        }
    }
}
