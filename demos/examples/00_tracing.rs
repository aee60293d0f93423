use screener::ScreeningController;
use screener_demos::common::get_backend;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,screener=debug,screener_http=trace
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let controller = ScreeningController::new(get_backend());
    let last = controller
        .start("2024-03-08")
        .await?
        .wait_terminal()
        .await
        .ok_or("run ended without a terminal snapshot")?;
    tracing::info!(phase = ?last.phase, found = last.results.len(), "done");

    Ok(())
}
