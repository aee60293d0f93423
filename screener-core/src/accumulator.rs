use std::sync::Arc;

use rust_decimal::Decimal;
use screener_types::{RunSummary, SharedRecord, StockRecord};

/// Ordered record set of one run.
///
/// Appends never deduplicate: the server is trusted not to resend a record in a
/// later window. The container only grows during a run, and readers receive
/// cheap `Arc` clones of the immutable records.
#[derive(Debug, Clone, Default)]
pub struct ResultAccumulator {
    records: Vec<SharedRecord>,
}

impl ResultAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append one round's records in arrival order.
    pub fn append(&mut self, records: impl IntoIterator<Item = StockRecord>) {
        #[cfg(feature = "tracing")]
        let before = self.records.len();

        self.records.extend(records.into_iter().map(Arc::new));

        #[cfg(feature = "tracing")]
        tracing::trace!(added = self.records.len() - before, total = self.records.len(), "records appended");
    }

    /// Clear to empty.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Ordered view of the current records.
    #[must_use]
    pub fn records(&self) -> &[SharedRecord] {
        &self.records
    }

    /// Owned snapshot sharing the underlying records.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedRecord> {
        self.records.clone()
    }

    /// Number of accumulated records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Derive summary statistics from the full record set.
    ///
    /// Always recomputed from scratch; an empty set yields zeros.
    #[must_use]
    pub fn summarize(&self, processed_stocks: u64, total_stocks: u64) -> RunSummary {
        let total_count = self.records.len() as u64;
        let (sum_change, sum_volume, total_market_cap) = self.records.iter().fold(
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            |(c, v, m), r| (c + r.change_pct, v + r.volume, m + r.market_cap),
        );
        let mean = |sum: Decimal| {
            if total_count == 0 {
                Decimal::ZERO
            } else {
                sum / Decimal::from(total_count)
            }
        };
        RunSummary {
            total_count,
            avg_change_pct: mean(sum_change),
            avg_volume: mean(sum_volume),
            total_market_cap,
            processed_stocks,
            total_stocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(code: &str, change: i64, volume: i64, cap: i64) -> StockRecord {
        StockRecord {
            code: code.into(),
            name: code.into(),
            current_price: Decimal::from(10),
            change_pct: Decimal::from(change),
            volume: Decimal::from(volume),
            turnover: Decimal::ZERO,
            market_cap: Decimal::from(cap),
        }
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let acc = ResultAccumulator::new();
        let s = acc.summarize(0, 0);
        assert_eq!(s, RunSummary::default());
    }

    #[test]
    fn summary_means_and_sums() {
        let mut acc = ResultAccumulator::new();
        acc.append(vec![rec("a", 2, 100, 1_000), rec("b", -1, 300, 2_000)]);
        acc.append(vec![rec("c", 5, 200, 3_000)]);
        let s = acc.summarize(60, 100);
        assert_eq!(s.total_count, 3);
        assert_eq!(s.avg_change_pct, Decimal::from(2));
        assert_eq!(s.avg_volume, Decimal::from(200));
        assert_eq!(s.total_market_cap, Decimal::from(6_000));
        assert_eq!((s.processed_stocks, s.total_stocks), (60, 100));
    }

    #[test]
    fn keeps_arrival_order_and_duplicates() {
        let mut acc = ResultAccumulator::new();
        acc.append(vec![rec("a", 0, 0, 0), rec("b", 0, 0, 0)]);
        acc.append(vec![rec("a", 0, 0, 0)]);
        let codes: Vec<&str> = acc.records().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["a", "b", "a"]);
        acc.reset();
        assert!(acc.is_empty());
    }

    #[test]
    fn snapshot_is_not_affected_by_later_appends() {
        let mut acc = ResultAccumulator::new();
        acc.append(vec![rec("a", 0, 0, 0)]);
        let snap = acc.snapshot();
        acc.append(vec![rec("b", 0, 0, 0)]);
        assert_eq!(snap.len(), 1);
        assert!(Arc::ptr_eq(&snap[0], &acc.records()[0]));
    }
}
