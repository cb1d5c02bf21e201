mod startup;

use gcal_manager::components::google_calendar::time::display_start;
use gcal_manager::components::google_calendar::{SessionManager, DEFAULT_EVENT_COUNT};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting gcal_manager");

    // Load configuration
    let config = startup::load_config()?;

    // Log in (or reuse the cached session) and list what is coming up
    let calendar = SessionManager::new(config).initialize().await?;
    let events = calendar.list_recent_events(DEFAULT_EVENT_COUNT).await?;

    if events.is_empty() {
        println!("No upcoming events found.");
    }
    for event in &events {
        println!(
            "{} {}",
            display_start(event),
            event.summary.as_deref().unwrap_or("(no title)")
        );
    }

    Ok(())
}
