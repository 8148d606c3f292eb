//! Terminal user interface (ratatui + crossterm).
//!
//! - [`app`]: state, wrapping the scan controller and resolution workflow
//! - [`events`]: key to [`Action`] mapping and crossterm polling
//! - [`ui`]: rendering
//! - [`run`]: terminal setup and the main loop
//! - [`theme`]: colour palettes
//!
//! Data flows one way: keys become actions, actions change the [`App`], and
//! the UI renders the [`App`].

pub mod app;
pub mod events;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppMode};
pub use events::{map_key, EventError, EventHandler};
pub use run::{run_tui, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::{format_size, render, truncate_path};
