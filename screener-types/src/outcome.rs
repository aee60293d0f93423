//! Batch requests and the normalized outcome of one screening round-trip.

use serde::{Deserialize, Serialize};

use crate::record::StockRecord;
use crate::summary::RunSummary;
use crate::ScreenerError;

/// Body of one `POST /screen` round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Logical screening date, `YYYY-MM-DD`.
    pub date: String,
    /// Offset of the first stock in this window.
    pub batch_start: u64,
    /// Window size.
    pub batch_size: u32,
}

impl BatchRequest {
    /// Build a request window for `date`.
    pub fn new(date: impl Into<String>, batch_start: u64, batch_size: u32) -> Self {
        Self {
            date: date.into(),
            batch_start,
            batch_size,
        }
    }
}

/// API-call telemetry reported alongside a batch. Display only; never drives
/// control flow. Each field is `None` when absent or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiStats {
    /// Upstream data-provider calls made by the server so far.
    pub api_calls_made: Option<u64>,
    /// Upstream call success rate, in percent.
    pub api_success_rate: Option<f64>,
    /// Whether the server confirmed the data came from the live provider.
    pub real_data_confirmed: Option<bool>,
}

impl ApiStats {
    /// Success rate if it is a finite percentage.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        self.api_success_rate.filter(|r| r.is_finite())
    }

    /// Telemetry is only worth showing once the server reports at least one call.
    #[must_use]
    pub fn has_calls(&self) -> bool {
        self.api_calls_made.is_some_and(|n| n > 0)
    }
}

/// Payload of a `batch_completed` response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchProgress {
    /// Qualifying records found in this window.
    pub results: Vec<StockRecord>,
    /// Stocks processed so far across all windows (cumulative).
    pub processed_count: u64,
    /// Total stocks the server intends to process.
    pub total_count: u64,
    /// Informational server message.
    pub message: String,
    /// Whether another window remains.
    pub has_more: bool,
    /// Optional telemetry.
    pub api_stats: Option<ApiStats>,
}

/// Payload of a legacy whole-result (`completed`) response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullResult {
    /// Every qualifying record.
    pub results: Vec<StockRecord>,
    /// Server-computed summary, adopted verbatim.
    pub summary: RunSummary,
    /// Informational server message.
    pub message: String,
}

/// Normalized result of a single round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// One window was processed; more may remain.
    BatchCompleted(BatchProgress),
    /// The server answered with the full, non-paginated result.
    FullCompleted(FullResult),
    /// The round failed; the error's display string is the user-visible reason.
    Failed(ScreenerError),
}

impl BatchOutcome {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BatchCompleted(_) => "batch_completed",
            Self::FullCompleted(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}

impl From<Result<Self, ScreenerError>> for BatchOutcome {
    fn from(res: Result<Self, ScreenerError>) -> Self {
        res.unwrap_or_else(Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_shown_only_with_calls_and_finite_rate() {
        let none = ApiStats::default();
        assert!(!none.has_calls());
        assert_eq!(none.success_rate(), None);

        let zero = ApiStats {
            api_calls_made: Some(0),
            ..ApiStats::default()
        };
        assert!(!zero.has_calls());

        let live = ApiStats {
            api_calls_made: Some(40),
            api_success_rate: Some(f64::NAN),
            real_data_confirmed: Some(true),
        };
        assert!(live.has_calls());
        assert_eq!(live.success_rate(), None);
    }
}
