use std::fmt::Write as _;

use screener_core::{
    ApiStats, BatchOutcome, BatchProgress, Decimal, FullResult, RunSummary, SharedRecord,
    StockRecord,
};

/// Size of the simulated market universe served by `MockScreener`.
pub const UNIVERSE: u64 = 100;

// (position in universe, code, name, price, change %, volume, turnover, market cap)
const QUALIFYING: &[(u64, &str, &str, &str, &str, i64, i64, i64)] = &[
    (3, "000001", "平安银行", "10.52", "2.35", 1_523_400, 16_025_000, 204_150_000_000),
    (11, "000002", "万科A", "7.81", "1.04", 2_310_700, 18_046_567, 93_200_000_000),
    (27, "000063", "中兴通讯", "28.40", "3.12", 845_200, 24_003_680, 135_800_000_000),
    (38, "000333", "美的集团", "62.15", "0.87", 401_900, 24_978_085, 433_600_000_000),
    (52, "000651", "格力电器", "38.77", "1.66", 512_300, 19_861_871, 218_300_000_000),
    (64, "000725", "京东方A", "4.12", "4.31", 9_874_100, 40_681_292, 155_400_000_000),
    (79, "000858", "五粮液", "142.60", "0.52", 210_800, 30_060_080, 553_500_000_000),
    (95, "002415", "海康威视", "31.05", "2.08", 688_400, 21_374_820, 289_700_000_000),
];

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

fn record(row: &(u64, &str, &str, &str, &str, i64, i64, i64)) -> StockRecord {
    let (_, code, name, price, change, volume, turnover, cap) = *row;
    StockRecord {
        code: code.to_string(),
        name: name.to_string(),
        current_price: dec(price),
        change_pct: dec(change),
        volume: Decimal::from(volume),
        turnover: Decimal::from(turnover),
        market_cap: Decimal::from(cap),
    }
}

/// Look up a fixture record by exchange code.
#[must_use]
pub fn stock(code: &str) -> Option<StockRecord> {
    QUALIFYING.iter().find(|r| r.1 == code).map(record)
}

/// Every qualifying fixture record, in universe order.
#[must_use]
pub fn all_qualifying() -> Vec<StockRecord> {
    QUALIFYING.iter().map(record).collect()
}

/// Qualifying fixture records whose universe position lies in `[start, end)`.
#[must_use]
pub fn qualifying_in(start: u64, end: u64) -> Vec<StockRecord> {
    QUALIFYING
        .iter()
        .filter(|r| (start..end).contains(&r.0))
        .map(record)
        .collect()
}

/// Synthetic record with a predictable code, for tests that only count or order.
#[must_use]
pub fn synthetic(tag: &str, idx: usize) -> StockRecord {
    StockRecord {
        code: format!("{tag}{idx:04}"),
        name: format!("{tag}-{idx}"),
        current_price: Decimal::from(10),
        change_pct: Decimal::ONE,
        volume: Decimal::from(1_000),
        turnover: Decimal::from(10_000),
        market_cap: Decimal::from(1_000_000),
    }
}

/// `n` synthetic records tagged `tag`.
#[must_use]
pub fn synthetic_batch(tag: &str, n: usize) -> Vec<StockRecord> {
    (0..n).map(|i| synthetic(tag, i)).collect()
}

/// A `batch_completed` outcome.
#[must_use]
pub fn batch(
    results: Vec<StockRecord>,
    processed_count: u64,
    total_count: u64,
    has_more: bool,
) -> BatchOutcome {
    BatchOutcome::BatchCompleted(BatchProgress {
        results,
        processed_count,
        total_count,
        message: format!("已处理 {processed_count}/{total_count} 只股票"),
        has_more,
        api_stats: Some(ApiStats {
            api_calls_made: Some(processed_count),
            api_success_rate: Some(100.0),
            real_data_confirmed: Some(true),
        }),
    })
}

/// A non-paginated `completed` outcome carrying the given summary.
#[must_use]
pub fn full(results: Vec<StockRecord>, summary: RunSummary) -> BatchOutcome {
    BatchOutcome::FullCompleted(FullResult {
        results,
        summary,
        message: "筛选完成".to_string(),
    })
}

/// Render records as CSV, the way the export endpoint would.
#[must_use]
pub fn render_csv(records: &[SharedRecord]) -> Vec<u8> {
    let mut out = String::from("code,name,current_price,change_pct,volume,turnover,market_cap\n");
    for r in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            r.code, r.name, r.current_price, r.change_pct, r.volume, r.turnover, r.market_cap
        );
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_partition_the_fixtures() {
        let mut seen = Vec::new();
        for start in (0..UNIVERSE).step_by(20) {
            seen.extend(qualifying_in(start, start + 20));
        }
        assert_eq!(seen, all_qualifying());
    }

    #[test]
    fn lookup_by_code() {
        assert_eq!(stock("000002").map(|s| s.name), Some("万科A".to_string()));
        assert!(stock("999999").is_none());
    }
}
