use futures::StreamExt;
use screener::ScreeningController;
use screener_demos::common::{get_backend, print_results, progress_line};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let controller = ScreeningController::new(get_backend());

    // Observe a job the server is already running.
    let mut updates = Box::pin(controller.follow_server_progress().await?.into_stream());
    while let Some(state) = updates.next().await {
        println!("{}", progress_line(&state));
    }

    print_results(&controller.state());
    Ok(())
}
