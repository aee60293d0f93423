use chrono::{DateTime, Utc};
use screener_types::{
    ExportFormat, ExportPayload, ExportRequest, ScreenerError, SharedRecord,
};

/// Builds export request descriptors from a result snapshot.
///
/// Pure: no I/O happens here. The caller sends the request (see
/// `ExportProvider`) and handles the returned file.
pub struct ExportRequestBuilder;

impl ExportRequestBuilder {
    /// Build a request for a format given by name (`"excel"` or `"csv"`).
    ///
    /// # Errors
    /// Returns `InvalidArg` for any other format name.
    pub fn build(format: &str, results: &[SharedRecord]) -> Result<ExportRequest, ScreenerError> {
        let format = format.parse::<ExportFormat>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(format = format.extension(), records = results.len(), "export request built");

        Ok(Self::build_for(format, results))
    }

    /// Build a request for an already validated format.
    #[must_use]
    pub fn build_for(format: ExportFormat, results: &[SharedRecord]) -> ExportRequest {
        ExportRequest {
            format,
            payload: ExportPayload {
                results: results.to_vec(),
            },
        }
    }
}

/// Download name for an exported file: `rescue_stocks_<YYYYMMDD_HHMMSS>.<ext>`.
#[must_use]
pub fn export_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "rescue_stocks_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}
