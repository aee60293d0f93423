//! Published controller state.

use serde::{Deserialize, Serialize};

use crate::outcome::ApiStats;
use crate::record::SharedRecord;
use crate::summary::{ProgressSnapshot, RunSummary};
use crate::ScreenerError;

/// Lifecycle phase of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningPhase {
    /// No run has been started.
    #[default]
    Idle,
    /// Rounds are being issued.
    Running,
    /// The run finished successfully.
    Completed,
    /// The run failed and cannot be resumed.
    Failed,
}

impl ScreeningPhase {
    /// `Completed` and `Failed` are terminal until the next start.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of the controller emitted after every state change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreeningState {
    /// Generation of the run this snapshot belongs to (0 before the first run).
    pub run_id: u64,
    /// Current phase.
    pub phase: ScreeningPhase,
    /// Screening date of the run, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Number of rounds whose outcome has been processed.
    pub rounds: u32,
    /// Progress indicator.
    pub progress: ProgressSnapshot,
    /// Accumulated records in arrival order.
    pub results: Vec<SharedRecord>,
    /// Summary derived from `results` (or adopted from a legacy response).
    pub summary: RunSummary,
    /// Latest telemetry, if the server reported any.
    pub api_stats: Option<ApiStats>,
    /// Terminal failure, if any.
    pub error: Option<ScreenerError>,
}

impl ScreeningState {
    /// True while a run is in progress (the "warn before leaving" signal).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == ScreeningPhase::Running
    }
}
