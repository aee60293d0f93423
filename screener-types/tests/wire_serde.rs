use std::sync::Arc;

use screener_types::{
    Decimal, ExportFormat, ExportPayload, ExportRequest, LegacyResults, ScreenerError,
    ScreeningPhase, ServerProgress, ServerStatus, StockRecord,
};

fn record(code: &str) -> StockRecord {
    StockRecord {
        code: code.to_string(),
        name: format!("Stock {code}"),
        current_price: Decimal::new(1550, 2),
        change_pct: Decimal::new(23, 1),
        volume: Decimal::from(1_000),
        turnover: Decimal::from(15_500),
        market_cap: Decimal::from(3_000_000),
    }
}

#[test]
fn export_format_parses_known_values_only() {
    assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
    assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    let err = "pdf".parse::<ExportFormat>().unwrap_err();
    assert!(matches!(err, ScreenerError::InvalidArg(_)));
    assert_eq!(ExportFormat::Excel.extension(), "xlsx");
}

#[test]
fn export_payload_serializes_numbers_as_json_numbers() {
    let req = ExportRequest {
        format: ExportFormat::Csv,
        payload: ExportPayload {
            results: vec![Arc::new(record("000001"))],
        },
    };
    assert_eq!(req.path(), "/export/csv");
    let body = serde_json::to_value(&req.payload).unwrap();
    let first = &body["results"][0];
    assert_eq!(first["code"], "000001");
    assert!(first["current_price"].is_number());
    assert_eq!(first["current_price"].as_f64(), Some(15.5));
}

#[test]
fn phase_serializes_snake_case() {
    let s = serde_json::to_string(&ScreeningPhase::Completed).unwrap();
    assert_eq!(s, "\"completed\"");
    assert!(ScreeningPhase::Failed.is_terminal());
    assert!(!ScreeningPhase::Running.is_terminal());
}

#[test]
fn legacy_progress_tolerates_unknown_status_and_fractional_progress() {
    let p: ServerProgress =
        serde_json::from_str(r#"{"status":"paused","progress":42.7}"#).unwrap();
    assert_eq!(p.status, ServerStatus::Unknown);
    assert_eq!(p.percentage(), Some(42));

    let p: ServerProgress = serde_json::from_str(r#"{"status":"running"}"#).unwrap();
    assert_eq!(p.percentage(), None);
}

#[test]
fn legacy_results_fill_missing_summary_counters() {
    let r: LegacyResults = serde_json::from_str(
        r#"{"success":true,"results":[],"summary":{"total_count":2,"avg_change_pct":2.05,"avg_volume":1111110,"total_market_cap":50000000000}}"#,
    )
    .unwrap();
    assert!(r.success);
    assert_eq!(r.summary.total_count, 2);
    assert_eq!(r.summary.avg_change_pct, Decimal::new(205, 2));
    assert_eq!(r.summary.processed_stocks, 0);
    assert_eq!(r.summary.total_stocks, 0);
}
