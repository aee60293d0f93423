//! Shapes of the legacy server-driven progress endpoints (`/progress`, `/results`).

use serde::{Deserialize, Serialize};

use crate::record::{StockRecord, null_as_default};
use crate::summary::RunSummary;

/// Status reported by `GET /progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// No job has been started on the server.
    Idle,
    /// The server is working.
    Running,
    /// Results are ready at `/results`.
    Completed,
    /// The job failed.
    Error,
    /// Any other value.
    #[serde(other)]
    Unknown,
}

/// Body of `GET /progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProgress {
    /// Job status.
    pub status: ServerStatus,
    /// Percentage reported by the server.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Informational message (error text when `status` is `error`).
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerProgress {
    /// Reported percentage as an integer in `0..=100`, if usable.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0).floor() as u8)
    }
}

/// Body of `GET /results`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyResults {
    /// Whether results are available.
    pub success: bool,
    /// Every qualifying record.
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<StockRecord>,
    /// Server-computed summary; `null` reads as an all-zero summary.
    #[serde(deserialize_with = "null_as_default")]
    pub summary: RunSummary,
    /// Informational or error message.
    pub message: Option<String>,
}
