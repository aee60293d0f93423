//! screener drives an incremental, server-paginated screening job to
//! completion and keeps a consistent running view of its results.
//!
//! Overview
//! - [`ScreeningController`] owns one run at a time. `start(date)` issues
//!   `POST /screen` windows of `batch_size` stocks, pausing `round_delay`
//!   between rounds, until the server reports no more data, answers with a
//!   whole result, or fails.
//! - Every state change is published as a [`ScreeningState`] snapshot: through
//!   the [`RunHandle`] returned by the start call and through a `watch`
//!   channel from [`ScreeningController::subscribe`].
//! - [`ScreeningMachine`] is the pure state machine behind the controller; it
//!   can be driven directly in tests.
//!
//! Key behaviors
//! - At most one round-trip is in flight. Round n+1 is never issued before the
//!   outcome of round n has been applied.
//! - Progress never moves backwards within a run and reaches 100 only on
//!   success. A failed run keeps its partial results (still exportable) and
//!   freezes progress.
//! - Starting a new run supersedes the old one: its pending deferral is
//!   cancelled and its late results are discarded.
//! - Each round is bounded by `round_timeout` (default 120 s).
//! - Deployments without pagination are followed with
//!   [`ScreeningController::follow_server_progress`].
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use screener::ScreeningController;
//! use screener_http::HttpScreener;
//!
//! let backend = Arc::new(HttpScreener::new("http://localhost:5000")?);
//! let controller = ScreeningController::builder()
//!     .with_backend(backend)
//!     .build()?;
//!
//! let mut run = controller.start("2024-03-08").await?;
//! while let Some(state) = run.next().await {
//!     println!("{}% {}", state.progress.percentage, state.progress.message);
//! }
//! let file = controller.export("excel").await?;
//! ```
#![warn(missing_docs)]

mod controller;
mod deferral;
/// Pure state machine and its events/actions.
#[allow(missing_docs)]
pub mod machine;

pub use controller::{RunHandle, ScreeningController, ScreeningControllerBuilder};
pub use deferral::Deferral;
pub use machine::{RunMode, ScreeningMachine, ScreeningRun};

pub use screener_core::{
    ApiStats, BatchOutcome, ExportFile, ExportFormat, ExportRequest, ProgressSnapshot,
    RunSummary, ScreenerBackend, ScreenerConfig, ScreenerError, ScreeningPhase, ScreeningState,
    SharedRecord, StockRecord,
};
