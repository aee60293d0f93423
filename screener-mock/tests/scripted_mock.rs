use screener_core::{
    BatchOutcome, BatchRequest, BatchSource, ExportFormat, ExportProvider, ExportRequestBuilder,
    ScreenerError, ServerProgress, ServerStatus,
};
use screener_mock::{MockBehavior, MockScreener, ScriptedScreener, fixtures};

#[tokio::test]
async fn scripted_rounds_are_served_in_order_and_logged() {
    let (mock, controller) = ScriptedScreener::new_with_controller("S0");
    controller
        .push_rounds([
            fixtures::batch(fixtures::synthetic_batch("A", 2), 20, 40, true),
            fixtures::batch(fixtures::synthetic_batch("B", 1), 40, 40, false),
        ])
        .await;

    let src = mock.as_batch_source().expect("batch source");
    let first = src.fetch_batch(&BatchRequest::new("2024-03-08", 0, 20)).await;
    let second = src.fetch_batch(&BatchRequest::new("2024-03-08", 20, 20)).await;
    assert_eq!(first.label(), "batch_completed");
    assert_eq!(second.label(), "batch_completed");

    let starts: Vec<u64> = controller
        .batch_requests()
        .await
        .iter()
        .map(|r| r.batch_start)
        .collect();
    assert_eq!(starts, [0, 20]);
}

#[tokio::test]
async fn unscripted_round_fails() {
    let (mock, _controller) = ScriptedScreener::new_with_controller("S0");
    let outcome = mock
        .as_batch_source()
        .expect("batch source")
        .fetch_batch(&BatchRequest::new("2024-03-08", 0, 20))
        .await;
    assert!(matches!(outcome, BatchOutcome::Failed(ScreenerError::Other(_))));
}

#[tokio::test]
async fn last_progress_response_is_sticky() {
    let (mock, controller) = ScriptedScreener::new_with_controller("S0");
    for pct in [10.0, 50.0] {
        controller
            .push_progress(MockBehavior::Return(ServerProgress {
                status: ServerStatus::Running,
                progress: Some(pct),
                message: None,
            }))
            .await;
    }
    let src = mock.as_progress_source().expect("progress source");
    let got: Vec<Option<u8>> = vec![
        src.progress().await.expect("p1").percentage(),
        src.progress().await.expect("p2").percentage(),
        src.progress().await.expect("p3").percentage(),
    ];
    assert_eq!(got, [Some(10), Some(50), Some(50)]);
    assert_eq!(controller.progress_polls().await, 3);
}

#[tokio::test]
async fn batch_only_hides_other_capabilities() {
    let (mock, _controller) = ScriptedScreener::batch_only("S0");
    assert!(mock.as_batch_source().is_some());
    assert!(mock.as_progress_source().is_none());
    assert!(mock.as_export_provider().is_none());
}

#[tokio::test]
async fn progress_only_hides_batch_rounds() {
    let (mock, _controller) = ScriptedScreener::progress_only("S0");
    assert!(mock.as_batch_source().is_none());
    assert!(mock.as_progress_source().is_some());
    assert!(mock.as_export_provider().is_none());
}

#[tokio::test]
async fn clear_all_forgets_script_and_logs() {
    let (mock, controller) = ScriptedScreener::new_with_controller("S0");
    controller
        .push_rounds([
            fixtures::batch(fixtures::synthetic_batch("A", 1), 20, 40, true),
            fixtures::batch(fixtures::synthetic_batch("B", 1), 40, 40, false),
        ])
        .await;
    let src = mock.as_batch_source().expect("batch source");
    src.fetch_batch(&BatchRequest::new("2024-03-08", 0, 20)).await;

    controller.clear_all().await;
    assert!(controller.batch_requests().await.is_empty());
    let outcome = src.fetch_batch(&BatchRequest::new("2024-03-08", 20, 20)).await;
    assert!(matches!(outcome, BatchOutcome::Failed(ScreenerError::Other(_))));
    assert_eq!(controller.batch_requests().await.len(), 1);
}

#[tokio::test]
async fn scripted_export_failure_is_returned() {
    let (mock, controller) = ScriptedScreener::new_with_controller("S0");
    controller
        .set_export(MockBehavior::Fail(ScreenerError::Http { status: 503 }))
        .await;
    let req = ExportRequestBuilder::build_for(
        ExportFormat::Excel,
        &[fixtures::synthetic("X", 0).into()],
    );
    let err = mock
        .as_export_provider()
        .expect("export provider")
        .export(&req)
        .await
        .unwrap_err();
    assert_eq!(err, ScreenerError::Http { status: 503 });
    assert_eq!(controller.export_requests().await.len(), 1);
}

#[tokio::test]
async fn fixture_backend_pages_the_universe() {
    let mock = MockScreener::new();
    let mut found = 0;
    let mut start = 0;
    loop {
        let outcome = mock
            .fetch_batch(&BatchRequest::new("2024-03-08", start, 20))
            .await;
        let BatchOutcome::BatchCompleted(p) = outcome else {
            panic!("expected batch progress, got {outcome:?}");
        };
        found += p.results.len();
        if !p.has_more {
            assert_eq!(p.processed_count, fixtures::UNIVERSE);
            break;
        }
        start += 20;
    }
    assert_eq!(found, fixtures::all_qualifying().len());
}

#[tokio::test]
async fn fixture_export_renders_csv() {
    let mock = MockScreener::new();
    let records: Vec<_> = fixtures::all_qualifying().into_iter().map(Into::into).collect();
    let req = ExportRequestBuilder::build_for(ExportFormat::Csv, &records);
    let file = mock.export(&req).await.expect("export");
    let text = String::from_utf8(file.bytes).expect("utf-8");
    assert!(text.starts_with("code,name,"));
    assert!(text.contains("000858,五粮液"));
    assert!(file.file_name.ends_with(".csv"));
}
