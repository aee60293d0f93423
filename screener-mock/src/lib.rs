//! screener-mock
//!
//! Backends for CI-safe tests and demos:
//! - [`MockScreener`] serves a fixed 100-stock universe deterministically.
//! - [`ScriptedScreener`] defers every call to a test-side [`ScriptedController`].

use async_trait::async_trait;
use chrono::Utc;

use screener_core::{
    BatchOutcome, BatchRequest, BatchSource, ExportFile, ExportProvider, ExportRequest,
    LegacyResults, ProgressSource, ResultAccumulator, ScreenerBackend, ScreenerError,
    ServerProgress, ServerStatus, export_file_name,
};

mod dynamic;
pub mod fixtures;

pub use dynamic::{MockBehavior, ScriptedController, ScriptedScreener};

/// Deterministic backend over the fixture universe.
///
/// Every window `[batch_start, batch_start + batch_size)` returns the fixture
/// records positioned inside it. The legacy endpoints report a finished job
/// with every fixture record.
pub struct MockScreener;

impl Default for MockScreener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScreener {
    /// Static backend name used in logs.
    pub const NAME: &'static str = "screener-mock";

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn window(req: &BatchRequest) -> Result<BatchOutcome, ScreenerError> {
        if req.date.trim().is_empty() {
            return Err(ScreenerError::rejected(None, "请选择日期"));
        }
        if req.batch_size == 0 {
            return Err(ScreenerError::invalid_input("batch_size must be positive"));
        }
        let start = req.batch_start.min(fixtures::UNIVERSE);
        let end = start
            .saturating_add(u64::from(req.batch_size))
            .min(fixtures::UNIVERSE);
        Ok(fixtures::batch(
            fixtures::qualifying_in(start, end),
            end,
            fixtures::UNIVERSE,
            end < fixtures::UNIVERSE,
        ))
    }
}

impl ScreenerBackend for MockScreener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn as_batch_source(&self) -> Option<&dyn BatchSource> {
        Some(self as &dyn BatchSource)
    }

    fn as_progress_source(&self) -> Option<&dyn ProgressSource> {
        Some(self as &dyn ProgressSource)
    }

    fn as_export_provider(&self) -> Option<&dyn ExportProvider> {
        Some(self as &dyn ExportProvider)
    }
}

#[async_trait]
impl BatchSource for MockScreener {
    async fn fetch_batch(&self, req: &BatchRequest) -> BatchOutcome {
        BatchOutcome::from(Self::window(req))
    }
}

#[async_trait]
impl ProgressSource for MockScreener {
    async fn progress(&self) -> Result<ServerProgress, ScreenerError> {
        Ok(ServerProgress {
            status: ServerStatus::Completed,
            progress: Some(100.0),
            message: Some("筛选完成".to_string()),
        })
    }

    async fn results(&self) -> Result<LegacyResults, ScreenerError> {
        let mut acc = ResultAccumulator::new();
        acc.append(fixtures::all_qualifying());
        Ok(LegacyResults {
            success: true,
            summary: acc.summarize(fixtures::UNIVERSE, fixtures::UNIVERSE),
            results: fixtures::all_qualifying(),
            message: None,
        })
    }
}

#[async_trait]
impl ExportProvider for MockScreener {
    async fn export(&self, req: &ExportRequest) -> Result<ExportFile, ScreenerError> {
        if req.payload.results.is_empty() {
            return Err(ScreenerError::rejected(None, "没有可导出的数据"));
        }
        Ok(ExportFile {
            file_name: export_file_name(req.format, Utc::now()),
            content_type: req.format.content_type().to_string(),
            bytes: fixtures::render_csv(&req.payload.results),
        })
    }
}
