//! Configuration shared by the controller and backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global configuration for a `ScreeningController`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenerConfig {
    /// Window size sent as `batch_size`; the offset advances by this amount
    /// after every successful round.
    pub batch_size: u32,
    /// Deferral between a `has_more` round and the next request.
    pub round_delay: Duration,
    /// Upper bound for a single round-trip. `None` waits indefinitely.
    pub round_timeout: Option<Duration>,
    /// Interval between `GET /progress` polls in legacy mode.
    pub legacy_poll_interval: Duration,
    /// Capacity of the per-run update channel.
    pub update_buffer: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            round_delay: Duration::from_secs(2),
            round_timeout: Some(Duration::from_secs(120)),
            legacy_poll_interval: Duration::from_secs(1),
            update_buffer: 256,
        }
    }
}
