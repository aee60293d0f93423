use std::sync::Arc;

use screener_core::display::{format_amount, format_change_pct, format_price};
use screener_core::{ScreenerBackend, ScreeningState};

/// Environment variable naming the screening service root.
pub const BASE_URL_ENV: &str = "SCREENER_DEMOS_BASE_URL";

/// Return a backend for the demos.
///
/// Talks to the service at `$SCREENER_DEMOS_BASE_URL` when set, otherwise
/// falls back to the in-process fixture backend.
///
/// # Panics
/// Panics if the configured base URL cannot be used to build an HTTP client.
#[must_use]
pub fn get_backend() -> Arc<dyn ScreenerBackend> {
    match std::env::var(BASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => Arc::new(
            screener_http::HttpScreener::new(url).expect("invalid screening service URL"),
        ),
        _ => {
            println!("--- (Using fixture backend) ---");
            Arc::new(screener_mock::MockScreener::new())
        }
    }
}

/// One progress line: `[ 40%] running  processed 40/100 stocks (3 found)`.
#[must_use]
pub fn progress_line(state: &ScreeningState) -> String {
    format!(
        "[{:>3}%] {:<9} {} ({} found)",
        state.progress.percentage,
        format!("{:?}", state.phase).to_lowercase(),
        state.progress.message,
        state.results.len()
    )
}

/// Print the results table and summary of a finished run.
pub fn print_results(state: &ScreeningState) {
    println!(
        "{:<8} {:<10} {:>10} {:>9} {:>10} {:>10}",
        "code", "name", "price", "change", "volume", "mkt cap"
    );
    for r in &state.results {
        println!(
            "{:<8} {:<10} {:>10} {:>9} {:>10} {:>10}",
            r.code,
            r.name,
            format_price(r.current_price),
            format_change_pct(r.change_pct),
            format_amount(r.volume),
            format_amount(r.market_cap)
        );
    }
    let s = &state.summary;
    println!(
        "found {} of {} processed; avg change {}, avg volume {}, total market cap {}",
        s.total_count,
        s.processed_stocks,
        format_change_pct(s.avg_change_pct),
        format_amount(s.avg_volume),
        format_amount(s.total_market_cap)
    );
    if let Some(stats) = state.api_stats.filter(|a| a.has_calls()) {
        let rate = stats
            .success_rate()
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"));
        println!(
            "upstream calls: {}, success rate: {rate}",
            stats.api_calls_made.unwrap_or_default()
        );
    }
}
