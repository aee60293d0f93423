use screener_types::ProgressSnapshot;

/// `floor(processed / total * 100)`, clamped to `0..=100`; zero when `total` is zero.
#[must_use]
pub fn percentage(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = u128::from(processed) * 100 / u128::from(total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Monotonic progress indicator for one run.
///
/// Intermediate updates never move backwards and stay below 100; only
/// [`ProgressTracker::complete`] reaches 100. [`ProgressTracker::reset`] is the
/// only way to go back to zero.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    current: ProgressSnapshot,
}

impl ProgressTracker {
    /// Highest percentage an unfinished run may show.
    pub const MAX_IN_FLIGHT: u8 = 99;

    /// Start at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to zero for a new run.
    pub fn reset(&mut self, message: impl Into<String>) {
        self.current = ProgressSnapshot::new(0, message);
    }

    /// Record an intermediate percentage; lower values keep the previous one.
    pub fn advance(&mut self, pct: u8, message: impl Into<String>) {
        let capped = pct.min(Self::MAX_IN_FLIGHT);
        let next = self.current.percentage.max(capped);
        self.current = ProgressSnapshot::new(next, message);
    }

    /// Update only the message, keeping the percentage frozen.
    pub fn note(&mut self, message: impl Into<String>) {
        self.current.message = message.into();
    }

    /// Terminal success.
    pub fn complete(&mut self, message: impl Into<String>) {
        self.current = ProgressSnapshot::new(100, message);
    }

    /// Current snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &ProgressSnapshot {
        &self.current
    }

    /// Current percentage.
    #[must_use]
    pub const fn percentage(&self) -> u8 {
        self.current.percentage
    }
}
