//! Screening-specific data transfer objects, configuration primitives, and the
//! workspace error type.
#![warn(missing_docs)]

mod config;
mod export;
mod legacy;
mod outcome;
mod record;
mod state;
mod summary;

pub use config::ScreenerConfig;
pub use export::{ExportFile, ExportFormat, ExportPayload, ExportRequest};
pub use legacy::{LegacyResults, ServerProgress, ServerStatus};
pub use outcome::{ApiStats, BatchOutcome, BatchProgress, BatchRequest, FullResult};
pub use record::{SharedRecord, StockRecord};
pub use rust_decimal::Decimal;
pub use state::{ScreeningPhase, ScreeningState};
pub use summary::{ProgressSnapshot, RunSummary};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the screening workspace.
///
/// The `Display` output of each variant is the user-visible failure reason that
/// the controller surfaces as the terminal message of a run.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScreenerError {
    /// Caller input was missing or malformed; nothing was sent to the server.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An argument violated the caller contract (e.g. an unknown export format).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error {status}")]
    Http {
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// The request never produced a response (unreachable host, reset, etc.).
    #[error("network request failed: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The server answered 2xx but reported `success = false`.
    #[error("{0}")]
    ServerRejected(String),

    /// The server answered with a `status` value this client does not know.
    #[error("{message}")]
    UnexpectedStatus {
        /// Raw status string as received (empty when absent).
        status: String,
        /// Message shown to the user.
        message: String,
    },

    /// A single screening round exceeded the configured timeout.
    #[error("screening round timed out after {timeout_ms}ms")]
    RoundTimeout {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The backend does not implement the requested capability.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label, e.g. "progress".
        capability: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl ScreenerError {
    /// Helper: build an `InvalidInput` error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Helper: build an `Unsupported` error for a capability label.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `ServerRejected` error, substituting `fallback` when the
    /// server did not supply a usable message.
    #[must_use]
    pub fn rejected(message: Option<&str>, fallback: &str) -> Self {
        Self::ServerRejected(non_blank(message).unwrap_or(fallback).to_string())
    }

    /// Helper: build an `UnexpectedStatus` error.
    #[must_use]
    pub fn unexpected_status(status: Option<&str>, message: Option<&str>, fallback: &str) -> Self {
        Self::UnexpectedStatus {
            status: status.unwrap_or_default().to_string(),
            message: non_blank(message).unwrap_or(fallback).to_string(),
        }
    }

    /// Returns true for failures of the transport layer (status, network,
    /// decoding, timeout) as opposed to a server-side rejection.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Network(_) | Self::Decode(_) | Self::RoundTimeout { .. }
        )
    }

    /// Returns true when the server answered but refused or misreported the job.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::ServerRejected(_) | Self::UnexpectedStatus { .. })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
