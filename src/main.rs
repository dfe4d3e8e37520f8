// main.rs

use taskboard_tui::api::HttpTaskStore;
use taskboard_tui::app::App;
use taskboard_tui::config::Config;
use taskboard_tui::{logging, ui};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    logging::setup(&config)?;
    info!(api_url = %config.api_url, "starting task dashboard");

    let store = Arc::new(HttpTaskStore::new(&config.api_url, config.api_key.clone()));
    let mut app = App::new(store);

    // A failed initial load leaves the board empty; 'r' retries.
    app.refresh_tasks().await;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(%err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
