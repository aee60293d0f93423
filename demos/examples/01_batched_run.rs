use std::time::Duration;

use screener::{ScreeningController, ScreeningPhase};
use screener_demos::common::{get_backend, print_results, progress_line};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let date = std::env::args().nth(1).unwrap_or_else(|| "2024-03-08".to_string());

    let controller = ScreeningController::builder()
        .with_backend(get_backend())
        .batch_size(20)
        .round_delay(Duration::from_millis(200))
        .build()?;

    let mut run = controller.start(&date).await?;
    let mut last = None;
    while let Some(state) = run.next().await {
        println!("{}", progress_line(&state));
        last = Some(state);
    }

    let last = last.ok_or("run ended without updates")?;
    match last.phase {
        ScreeningPhase::Completed => print_results(&last),
        _ => println!("run did not complete: {}", last.progress.message),
    }

    Ok(())
}
