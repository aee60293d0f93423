use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use screener::{BatchOutcome, ScreenerError, ScreeningController, ScreeningPhase};
use screener_core::{LegacyResults, RunSummary, ServerProgress, ServerStatus};
use screener_mock::{MockBehavior, MockScreener, ScriptedScreener, fixtures};

fn progress(status: ServerStatus, pct: Option<f64>) -> MockBehavior<ServerProgress> {
    MockBehavior::Return(ServerProgress {
        status,
        progress: pct,
        message: Some("working".to_string()),
    })
}

#[tokio::test(start_paused = true)]
async fn follows_server_progress_until_results() {
    let (backend, script) = ScriptedScreener::new_with_controller("scripted");
    script.push_progress(progress(ServerStatus::Running, Some(30.0))).await;
    script
        .push_progress(MockBehavior::Fail(ScreenerError::Network("blip".into())))
        .await;
    script.push_progress(progress(ServerStatus::Running, Some(70.0))).await;
    script.push_progress(progress(ServerStatus::Completed, Some(100.0))).await;
    let summary = RunSummary {
        total_count: 8,
        processed_stocks: 100,
        total_stocks: 100,
        ..RunSummary::default()
    };
    script
        .set_results(MockBehavior::Return(LegacyResults {
            success: true,
            results: fixtures::all_qualifying(),
            summary: summary.clone(),
            message: None,
        }))
        .await;
    let controller = ScreeningController::builder()
        .with_backend(backend)
        .legacy_poll_interval(Duration::from_millis(500))
        .build()
        .expect("controller");

    let run = controller
        .follow_server_progress()
        .await
        .expect("follow starts");
    let states: Vec<_> = run.into_stream().collect().await;

    let pct: Vec<u8> = states.iter().map(|s| s.progress.percentage).collect();
    assert!(pct.windows(2).all(|w| w[0] <= w[1]), "monotonic: {pct:?}");
    assert_eq!(pct.first(), Some(&0));
    assert!(pct.contains(&30));
    assert!(pct.contains(&70));

    let last = states.last().expect("terminal snapshot");
    assert_eq!(last.phase, ScreeningPhase::Completed);
    assert_eq!(last.progress.percentage, 100);
    assert_eq!(last.summary, summary);
    assert_eq!(last.results.len(), 8);
    assert_eq!(last.date, None);
    assert_eq!(script.progress_polls().await, 4);
}

#[tokio::test(start_paused = true)]
async fn server_error_fails_the_followed_run() {
    let (backend, script) = ScriptedScreener::new_with_controller("scripted");
    script
        .push_progress(MockBehavior::Return(ServerProgress {
            status: ServerStatus::Error,
            progress: None,
            message: Some("data source unavailable".into()),
        }))
        .await;
    let controller = ScreeningController::new(backend);

    let last = controller
        .follow_server_progress()
        .await
        .expect("follow starts")
        .wait_terminal()
        .await
        .expect("terminal snapshot");
    assert_eq!(last.phase, ScreeningPhase::Failed);
    assert_eq!(last.progress.message, "data source unavailable");
}

#[tokio::test]
async fn follow_requires_progress_capability() {
    let (backend, _script) = ScriptedScreener::batch_only("batch-only");
    let controller = ScreeningController::new(backend);
    let err = controller.follow_server_progress().await.unwrap_err();
    assert!(matches!(err, ScreenerError::Unsupported { .. }));
}

#[tokio::test(start_paused = true)]
async fn partial_results_stay_exportable_after_failure() {
    let (backend, script) = ScriptedScreener::new_with_controller("scripted");
    script
        .push_rounds([
            fixtures::batch(fixtures::qualifying_in(0, 20), 20, 100, true),
            BatchOutcome::Failed(ScreenerError::ServerRejected("quota exhausted".into())),
        ])
        .await;
    let controller = ScreeningController::new(backend);
    controller
        .start("2024-03-08")
        .await
        .expect("run starts")
        .wait_terminal()
        .await
        .expect("terminal snapshot");

    let req = controller.export_request("excel").expect("excel");
    let codes: Vec<&str> = req.payload.results.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["000001", "000002"]);

    let file = controller.export("csv").await.expect("export");
    assert!(file.file_name.starts_with("rescue_stocks_"));
    assert!(file.file_name.ends_with(".csv"));
    assert!(String::from_utf8_lossy(&file.bytes).contains("000002,万科A"));
    assert_eq!(script.export_requests().await.len(), 1);

    let err = controller.export_request("pdf").unwrap_err();
    assert!(matches!(err, ScreenerError::InvalidArg(_)));
}

#[tokio::test]
async fn exporting_nothing_is_rejected() {
    let controller = ScreeningController::new(Arc::new(MockScreener::new()));
    let err = controller.export("excel").await.unwrap_err();
    assert!(matches!(err, ScreenerError::InvalidInput(_)));
}

#[tokio::test(start_paused = true)]
async fn fixture_backend_runs_to_completion() {
    let controller = ScreeningController::new(Arc::new(MockScreener::new()));
    let last = controller
        .start("2024-03-08")
        .await
        .expect("run starts")
        .wait_terminal()
        .await
        .expect("terminal snapshot");
    assert_eq!(last.phase, ScreeningPhase::Completed);
    assert_eq!(last.results.len(), fixtures::all_qualifying().len());
    assert_eq!(last.summary.total_stocks, fixtures::UNIVERSE);
    assert_eq!(last.rounds, 5);
}
