use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::prelude::*;
use std::io;

use todo_plus::app::{
    capture::CameraState,
    config::Config,
    location::get_current_coordinates,
    logging,
    storage::SqliteStore,
    ui::{run_app, App},
};

// Start the app.
// The terminal loop is based on:
// https://github.com/ratatui-org/ratatui/blob/main/examples/list.rs
pub fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| logging::default_log_level().to_string());
    let _logger = logging::init_logging(&level, &config.log_dir)
        .context("failed to initialize logging")?;

    // Permissions and one-shot reads happen before the first frame
    let mut capture = config.capture_provider();
    let camera = CameraState::request(capture.as_mut());
    let location = get_current_coordinates(config.location_provider().as_mut());

    let storage = SqliteStore::open(&config.db)
        .with_context(|| format!("failed to open the database at {}", config.db.display()))?;
    let app = App::new(&storage, location, camera, capture);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, config.tick_rate());

    // Restore previous terminal state after exit
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match res {
        Ok(()) => {
            info!("event=app_quit module=main status=ok");
            Ok(())
        }
        Err(err) => {
            error!("event=app_quit module=main status=error error={err}");
            Err(err.into())
        }
    }
}
