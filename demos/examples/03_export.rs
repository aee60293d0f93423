use std::time::Duration;

use screener::ScreeningController;
use screener_demos::common::get_backend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let controller = ScreeningController::builder()
        .with_backend(get_backend())
        .round_delay(Duration::from_millis(100))
        .build()?;

    controller
        .start("2024-03-08")
        .await?
        .wait_terminal()
        .await
        .ok_or("run ended without a terminal snapshot")?;

    for format in ["excel", "csv"] {
        let req = controller.export_request(format)?;
        println!(
            "{format}: {} records -> {}",
            req.payload.results.len(),
            req.format.extension()
        );
    }

    let file = controller.export("csv").await?;
    println!("{} ({}, {} bytes)", file.file_name, file.content_type, file.bytes.len());
    print!("{}", String::from_utf8_lossy(&file.bytes));

    Ok(())
}
