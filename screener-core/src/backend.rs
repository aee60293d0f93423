use async_trait::async_trait;

use screener_types::{
    BatchOutcome, BatchRequest, ExportFile, ExportRequest, LegacyResults, ScreenerError,
    ServerProgress,
};

/// Focused role trait for backends that serve paginated screening rounds.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Perform one round-trip for the given window.
    ///
    /// Never returns an error: transport and server failures are normalized
    /// into [`BatchOutcome::Failed`].
    async fn fetch_batch(&self, req: &BatchRequest) -> BatchOutcome;
}

/// Focused role trait for backends that expose server-driven progress
/// (`GET /progress` and `GET /results`).
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Fetch the current job status.
    async fn progress(&self) -> Result<ServerProgress, ScreenerError>;

    /// Fetch the finished job's results.
    async fn results(&self) -> Result<LegacyResults, ScreenerError>;
}

/// Focused role trait for backends that render result files.
#[async_trait]
pub trait ExportProvider: Send + Sync {
    /// Send the export request and return the produced file.
    async fn export(&self, req: &ExportRequest) -> Result<ExportFile, ScreenerError>;
}

/// Main backend trait. Exposes capability discovery.
pub trait ScreenerBackend: Send + Sync {
    /// A stable identifier used in logs (e.g. "screener-http").
    fn name(&self) -> &'static str;

    /// Advertise batch screening by returning a usable trait object when supported.
    fn as_batch_source(&self) -> Option<&dyn BatchSource> {
        None
    }

    /// If implemented, returns a trait object for legacy progress polling.
    fn as_progress_source(&self) -> Option<&dyn ProgressSource> {
        None
    }

    /// If implemented, returns a trait object for file export.
    fn as_export_provider(&self) -> Option<&dyn ExportProvider> {
        None
    }
}
