//! Raw response shapes of the screening service and their normalization.

use serde::Deserialize;
use serde_json::Value;

use screener_core::{
    ApiStats, BatchOutcome, BatchProgress, FullResult, RunSummary, ScreenerError, StockRecord,
};

const REJECTED_FALLBACK: &str = "screening request failed";
const UNEXPECTED_FALLBACK: &str = "screening processing failed";

/// Body of a `POST /screen` response. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScreenResponse {
    pub success: bool,
    pub status: Option<String>,
    pub message: Option<String>,
    pub results: Option<Vec<StockRecord>>,
    pub processed_count: Option<u64>,
    pub total_stocks: Option<u64>,
    pub has_more: Option<bool>,
    pub summary: Option<RunSummary>,
    pub api_calls_made: Option<Value>,
    pub api_success_rate: Option<Value>,
    pub verification_info: Option<Value>,
}

impl ScreenResponse {
    /// Map the response onto the tagged outcome.
    ///
    /// # Errors
    /// `ServerRejected` when `success` is false, `UnexpectedStatus` for any
    /// status other than `batch_completed` or `completed`.
    pub fn into_outcome(self) -> Result<BatchOutcome, ScreenerError> {
        if !self.success {
            return Err(ScreenerError::rejected(
                self.message.as_deref(),
                REJECTED_FALLBACK,
            ));
        }
        let api_stats = self.api_stats();
        match self.status.as_deref() {
            Some("batch_completed") => Ok(BatchOutcome::BatchCompleted(BatchProgress {
                results: self.results.unwrap_or_default(),
                processed_count: self.processed_count.unwrap_or(0),
                total_count: self.total_stocks.unwrap_or(0),
                message: self.message.unwrap_or_default(),
                has_more: self.has_more.unwrap_or(false),
                api_stats,
            })),
            Some("completed") => Ok(BatchOutcome::FullCompleted(FullResult {
                results: self.results.unwrap_or_default(),
                summary: self.summary.unwrap_or_default(),
                message: self.message.unwrap_or_default(),
            })),
            status => Err(ScreenerError::unexpected_status(
                status,
                self.message.as_deref(),
                UNEXPECTED_FALLBACK,
            )),
        }
    }

    fn api_stats(&self) -> Option<ApiStats> {
        let stats = ApiStats {
            api_calls_made: self.api_calls_made.as_ref().and_then(count),
            api_success_rate: self
                .api_success_rate
                .as_ref()
                .and_then(Value::as_f64)
                .filter(|r| r.is_finite()),
            real_data_confirmed: self
                .verification_info
                .as_ref()
                .and_then(|v| v.get("real_data_confirmed"))
                .and_then(Value::as_bool),
        };
        (stats != ApiStats::default()).then_some(stats)
    }
}

fn count(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.floor() as u64)
    })
}

/// Replace the non-standard `NaN`, `Infinity` and `-Infinity` tokens some
/// servers emit with `null`, leaving string contents untouched.
pub fn sanitize_non_finite(body: &str) -> String {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = body;
    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(tok) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[tok.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}
