//! TUI layout and rendering with ratatui.
//!
//! Layout, top to bottom: header, mode content, log panel, footer. Modal
//! dialogs (delete confirmation, error notice) draw over the content.
//!
//! ```no_run
//! use vidupe::tui::app::App;
//! use vidupe::tui::ui::render;
//! use ratatui::Frame;
//!
//! fn draw(frame: &mut Frame, app: &App) {
//!     render(frame, app);
//! }
//! ```

use bytesize::ByteSize;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppMode};

/// Lines of log shown under the content.
const LOG_PANEL_LINES: u16 = 8;

// ==================== Accessible Mode Helpers ====================

const ASCII_BORDER_SET: border::Set = border::Set {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    vertical_left: "|",
    vertical_right: "|",
    horizontal_top: "-",
    horizontal_bottom: "-",
};

fn create_block<'a>(app: &App, title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(if app.is_accessible() {
            ASCII_BORDER_SET
        } else {
            border::ROUNDED
        })
        .title(title)
}

/// Render the whole screen for the current state.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(LOG_PANEL_LINES + 2),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    match app.mode() {
        AppMode::Scanning => render_scanning_content(frame, app, chunks[1]),
        AppMode::Reviewing => render_review_content(frame, app, chunks[1]),
        AppMode::Confirming | AppMode::Done => render_done_content(frame, app, chunks[1]),
        AppMode::Quitting => render_quitting_content(frame, app, chunks[1]),
    }
    render_log(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.mode() == AppMode::Confirming {
        render_confirm_dialog(frame, app, area);
    }
    if app.status().is_some() {
        render_status_dialog(frame, app, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = match app.mode() {
        AppMode::Scanning => "Scanning",
        AppMode::Reviewing => "Review",
        AppMode::Confirming => "Confirm Delete",
        AppMode::Done => "Done",
        AppMode::Quitting => "Goodbye",
    };
    let text = format!(
        "vidupe [{}] {} | mode: {} | {} staged",
        state,
        app.root().display(),
        app.workflow().mode(),
        app.workflow().staged_count()
    );

    let header = Paragraph::new(text)
        .style(Style::default().fg(app.theme().primary).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(create_block(app, "").border_style(Style::default().fg(app.theme().primary)));
    frame.render_widget(header, area);
}

fn render_scanning_content(frame: &mut Frame, app: &App, area: Rect) {
    let block = create_block(app, " Scan ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let (percent, counts, current) = match app.progress() {
        Some(p) => (
            p.percentage(),
            format!("{}/{} files", p.processed, p.total),
            p.current_path.to_string_lossy().into_owned(),
        ),
        None => (0, "Looking for videos...".to_string(), String::new()),
    };

    frame.render_widget(
        Paragraph::new(counts)
            .style(Style::default().fg(app.theme().normal))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(app.theme().success).bg(app.theme().dim))
        .percent(percent)
        .label(format!("{percent}%"));
    frame.render_widget(gauge, chunks[1]);

    frame.render_widget(
        Paragraph::new(truncate_path(&current, chunks[2].width as usize))
            .style(Style::default().fg(app.theme().dim))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn render_review_content(frame: &mut Frame, app: &App, area: Rect) {
    let Some(group) = app.current_group() else {
        render_done_content(frame, app, area);
        return;
    };

    let (position, total) = app
        .workflow()
        .session()
        .map_or((0, 0), |s| (s.processed_groups(), s.total_groups()));
    let title = format!(" Group {position} of {total} ");

    let block = create_block(app, title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    frame.render_widget(
        Paragraph::new(group.header())
            .style(Style::default().fg(app.theme().primary).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    let width = chunks[1].width.saturating_sub(8) as usize;
    let items: Vec<ListItem> = group
        .paths()
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let staged = app.workflow().ledger().is_staged(path);
            let mut style = if staged {
                Style::default().fg(app.theme().danger)
            } else {
                Style::default().fg(app.theme().normal)
            };
            if index == app.selected() {
                style = style
                    .fg(app.theme().inverted_fg)
                    .bg(app.theme().secondary)
                    .add_modifier(Modifier::BOLD);
            }
            let suffix = if staged { " (staged)" } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" [{index}] "), style),
                Span::styled(
                    format!("{}{}", truncate_path(&path.to_string_lossy(), width), suffix),
                    style,
                ),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), chunks[1]);
}

fn render_done_content(frame: &mut Frame, app: &App, area: Rect) {
    let workflow = app.workflow();
    let mut lines = Vec::new();

    match workflow.session() {
        Some(session) if session.is_aborted() => {
            lines.push(Line::styled("Scan aborted.", Style::default().fg(app.theme().danger)));
        }
        Some(session) => {
            let summary = session.summary();
            lines.push(Line::from(format!(
                "{} videos, {} duplicate groups, {} reclaimable",
                session.files_discovered(),
                session.total_groups(),
                summary.map_or_else(|| format_size(0), |s| s.reclaimable_display())
            )));
            if let Some(failed) = summary.map(|s| s.failures.len()).filter(|n| *n > 0) {
                lines.push(Line::styled(
                    format!("{failed} files could not be fingerprinted"),
                    Style::default().fg(app.theme().dim),
                ));
            }
        }
        None => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::styled(
        format!(
            "{} files marked for deletion ({})",
            workflow.staged_count(),
            format_size(workflow.ledger().staged_bytes())
        ),
        Style::default().fg(app.theme().danger).add_modifier(Modifier::BOLD),
    ));
    if !workflow.skipped().is_empty() {
        lines.push(Line::from(format!("{} groups skipped", workflow.skipped().len())));
    }
    if let Some(auto) = app.auto_report() {
        let verb = if auto.cancelled { "stopped after" } else { "resolved" };
        lines.push(Line::from(format!(
            "Auto mode {verb} {} of {} groups",
            auto.groups_processed, auto.total_groups
        )));
    }
    if let Some(result) = app.last_commit() {
        lines.push(Line::styled(result.summary(), Style::default().fg(app.theme().success)));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(create_block(app, " Results "));
    frame.render_widget(paragraph, area);
}

fn render_quitting_content(frame: &mut Frame, app: &App, area: Rect) {
    let message = Paragraph::new("Goodbye!")
        .style(Style::default().fg(app.theme().success))
        .alignment(Alignment::Center)
        .block(create_block(app, ""));
    frame.render_widget(message, area);
}

fn render_log(frame: &mut Frame, app: &App, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .log_tail(rows)
        .into_iter()
        .map(|line| Line::styled(line, Style::default().fg(app.theme().dim)))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(create_block(app, " Log ")), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let spans: Vec<Span> = footer_commands(app)
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(
                    format!("[{key}]"),
                    Style::default().fg(app.theme().secondary).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{desc} "), Style::default().fg(app.theme().normal)),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block(app, "").border_style(Style::default().fg(app.theme().dim)));
    frame.render_widget(footer, area);
}

fn footer_commands(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.mode() {
        AppMode::Scanning if app.is_scanning() => vec![("k", "Kill scan"), ("q", "Quit")],
        AppMode::Scanning => vec![("q", "Quit")],
        AppMode::Reviewing => vec![
            ("0-9", "Keep"),
            ("Enter", "Keep selected"),
            ("p", "Play"),
            ("s", "Skip"),
            ("x", "Stop"),
            ("u", "Undo"),
            ("q", "Quit"),
        ],
        AppMode::Done => vec![
            ("d", "Delete staged"),
            ("u", "Undo"),
            ("b", "Revisit skipped"),
            ("r", "Scan again"),
            ("q", "Quit"),
        ],
        AppMode::Confirming => vec![("y", "Delete"), ("n", "Cancel")],
        AppMode::Quitting => vec![],
    }
}

fn render_confirm_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(50, 30, area);
    let text = vec![
        Line::from(format!(
            "Delete {} staged files ({})?",
            app.workflow().staged_count(),
            app.delete_method()
        )),
        Line::from(""),
        Line::styled("[y] Delete   [n] Cancel", Style::default().fg(app.theme().secondary)),
    ];

    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(create_block(app, " Confirm ").border_style(Style::default().fg(app.theme().danger))),
        dialog,
    );
}

fn render_status_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(60, 20, area);
    let text = app.status().unwrap_or_default().to_string();

    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(app.theme().danger))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(create_block(app, " Notice (Esc) ")),
        dialog,
    );
}

/// Format a byte count with binary units.
///
/// ```
/// use vidupe::tui::ui::format_size;
///
/// assert_eq!(format_size(1024), "1.0 KiB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Truncate a path to `max_len` characters, keeping the file name.
///
/// ```
/// use vidupe::tui::ui::truncate_path;
///
/// let long = "/very/long/path/to/some/deeply/nested/clip.mp4";
/// let truncated = truncate_path(long, 30);
/// assert!(truncated.ends_with("clip.mp4"));
/// assert!(truncated.contains("..."));
/// ```
#[must_use]
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let len = path.chars().count();
    if len <= max_len {
        return path.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }

    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let name_len = name.chars().count();
    if name_len + 4 <= max_len {
        let head: String = path.chars().take(max_len - name_len - 4).collect();
        return format!("{head}.../{name}");
    }

    let tail: String = path.chars().skip(len - (max_len - 3)).collect();
    format!("...{tail}")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
