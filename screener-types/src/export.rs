//! Export request descriptors and the file payload returned by the server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::SharedRecord;
use crate::ScreenerError;

/// File formats the export endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet (`.xlsx`).
    Excel,
    /// Comma-separated values (`.csv`).
    Csv,
}

impl ExportFormat {
    /// Path segment used in `/export/{format}`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Csv => "csv",
        }
    }

    /// File extension of the downloaded file.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Csv => "csv",
        }
    }

    /// MIME type the server sends for this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excel" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            other => Err(ScreenerError::InvalidArg(format!(
                "unsupported export format '{other}' (expected 'excel' or 'csv')"
            ))),
        }
    }
}

/// JSON body of `POST /export/{format}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Records to export, in display order.
    pub results: Vec<SharedRecord>,
}

/// Descriptor of an export call. Building one performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Requested file format.
    pub format: ExportFormat,
    /// Request body.
    pub payload: ExportPayload,
}

impl ExportRequest {
    /// Endpoint path for this request, e.g. `/export/csv`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/export/{}", self.format.as_str())
    }
}

/// File produced by the export endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name, `rescue_stocks_<YYYYMMDD_HHMMSS>.<ext>`.
    pub file_name: String,
    /// MIME type reported by the server, or the format's default.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}
