//! screener-core
//!
//! Core building blocks shared across the screening client.
//!
//! - `accumulator`: the growing record set of a run and its derived summary.
//! - `progress`: percentage math and the monotonic progress tracker.
//! - `export`: pure construction of export request descriptors.
//! - `backend`: the `ScreenerBackend` trait and its focused capability traits.
//! - `display`: number formatting helpers for result consumers.
//!
//! Nothing in this crate performs I/O; backends live in `screener-http` and
//! `screener-mock`, orchestration in `screener`.
#![warn(missing_docs)]

/// Ordered accumulation of records across rounds.
pub mod accumulator;
/// Backend capability traits.
pub mod backend;
pub mod display;
/// Export request construction and file naming.
pub mod export;
/// Progress percentage math.
pub mod progress;

pub use accumulator::ResultAccumulator;
pub use backend::{BatchSource, ExportProvider, ProgressSource, ScreenerBackend};
pub use export::{ExportRequestBuilder, export_file_name};
pub use progress::{ProgressTracker, percentage};

pub use screener_types::{
    ApiStats, BatchOutcome, BatchProgress, BatchRequest, Decimal, ExportFile, ExportFormat,
    ExportPayload, ExportRequest, FullResult, LegacyResults, ProgressSnapshot, RunSummary,
    ScreenerConfig, ScreenerError, ScreeningPhase, ScreeningState, ServerProgress, ServerStatus,
    SharedRecord, StockRecord,
};
