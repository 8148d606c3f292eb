//! Keyboard input.
//!
//! [`map_key`] is a pure function from the current [`AppMode`] and a key to
//! an [`Action`]; [`EventHandler`] only polls crossterm.
//!
//! | Mode       | Keys                                                            |
//! |------------|-----------------------------------------------------------------|
//! | Scanning   | `k`/`Esc`/`Ctrl+C` kill, `q` quit                               |
//! | Reviewing  | `0`-`9` keep, `Enter` keep highlighted, `j`/`k` move, `p` play, |
//! |            | `s` skip, `x` stop, `u` undo, `q` quit                          |
//! | Done       | `d` delete staged, `u` undo, `b` revisit skipped, `r` rescan,   |
//! |            | `q` quit                                                        |
//! | Confirming | `y`/`Enter` delete, `n`/`Esc` cancel                            |

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use super::app::{Action, AppMode};

/// Error reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to read terminal event: {0}")]
    Read(#[from] std::io::Error),
}

/// Translate a key press into an action for `mode`.
#[must_use]
pub fn map_key(mode: AppMode, key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');

    match mode {
        AppMode::Scanning => match key.code {
            _ if ctrl_c => Some(Action::Kill),
            KeyCode::Char('k') | KeyCode::Esc => Some(Action::Kill),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        AppMode::Reviewing => match key.code {
            _ if ctrl_c => Some(Action::Quit),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                c.to_digit(10).map(|d| Action::Keep(d as usize))
            }
            KeyCode::Enter => Some(Action::KeepSelected),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::NavigateUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::NavigateDown),
            KeyCode::Char('p') => Some(Action::Preview),
            KeyCode::Char('s') => Some(Action::Skip),
            KeyCode::Char('x') => Some(Action::Stop),
            KeyCode::Char('u') => Some(Action::Undo),
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        AppMode::Done => match key.code {
            _ if ctrl_c => Some(Action::Quit),
            KeyCode::Char('d') => Some(Action::Commit),
            KeyCode::Char('u') => Some(Action::Undo),
            KeyCode::Char('b') => Some(Action::RevisitSkipped),
            KeyCode::Char('r') => Some(Action::ScanAgain),
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        AppMode::Confirming => match key.code {
            _ if ctrl_c => Some(Action::Cancel),
            KeyCode::Char('y') | KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Char('n') | KeyCode::Esc => Some(Action::Cancel),
            _ => None,
        },
        AppMode::Quitting => None,
    }
}

/// Polls crossterm for key events.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventHandler;

impl EventHandler {
    /// Create a handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for a key press and map it for `mode`.
    ///
    /// Non-key events (resize, focus) return `None`; the next draw picks up
    /// the new size.
    ///
    /// # Errors
    ///
    /// Terminal read failures.
    pub fn poll(&self, mode: AppMode, timeout: Duration) -> Result<Option<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(map_key(mode, &key)),
            _ => Ok(None),
        }
    }
}
