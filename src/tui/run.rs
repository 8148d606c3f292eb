//! TUI main loop.
//!
//! Takes over the terminal (raw mode, alternate screen, hidden cursor) and
//! restores it on exit, including on panic. Each turn of the loop:
//!
//! 1. drains scan events with [`App::tick`]
//! 2. draws the current state
//! 3. waits up to the poll interval for a key and applies its action
//!
//! The poll interval is therefore both the input timeout and the cadence at
//! which scan progress reaches the screen.

use std::io::{self, Stdout};
use std::panic;

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::App;
use super::events::{EventError, EventHandler};
use super::ui::render;
use crate::controller::ControllerError;

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// The background scan could not be started.
    #[error(transparent)]
    Scan(#[from] ControllerError),
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Start the scan and run the interactive loop until the user quits.
///
/// # Errors
///
/// Terminal I/O failures, or the scan thread failing to start.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vidupe::scanner::FrameExtractor;
/// use vidupe::session::ResolveMode;
/// use vidupe::tui::{run_tui, App};
///
/// let mut app = App::new("/videos", ResolveMode::Manual, Arc::new(FrameExtractor::default()));
/// if let Err(e) = run_tui(&mut app) {
///     eprintln!("TUI error: {}", e);
/// }
/// ```
pub fn run_tui(app: &mut App) -> TuiResult<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let result = setup_terminal().and_then(|mut terminal| {
        let result = run_loop(&mut terminal, app);
        restore_terminal();
        result
    });

    let _ = panic::take_hook();
    result
}

fn run_loop(terminal: &mut Terminal, app: &mut App) -> TuiResult<()> {
    let events = EventHandler::new();
    app.start_scan()?;

    while !app.should_quit() {
        app.tick();
        terminal.draw(|frame| render(frame, app))?;

        if let Some(action) = events.poll(app.mode(), app.poll_interval())? {
            log::trace!("Action: {:?}", action);
            app.handle_action(action);
        }
    }

    log::debug!("TUI exited normally");
    Ok(())
}

fn setup_terminal() -> TuiResult<Terminal> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Ok(ratatui::Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
}
