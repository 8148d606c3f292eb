//! Colour palettes for the TUI.

use ratatui::style::Color;

use crate::cli::ThemeArg;

/// Colours used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Headers and borders.
    pub primary: Color,
    /// Key hints and the highlighted member.
    pub secondary: Color,
    /// Staged files, errors.
    pub danger: Color,
    /// Kept files, progress.
    pub success: Color,
    /// Secondary text.
    pub dim: Color,
    /// Main text.
    pub normal: Color,
    /// Text on a coloured background.
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast dark palette (default).
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// High-contrast light palette.
    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::Gray,
            normal: Color::Black,
            inverted_fg: Color::White,
        }
    }

    /// Light if the terminal advertises a light background, else dark.
    #[must_use]
    pub fn auto() -> Self {
        if is_light_terminal() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Palette for a CLI/config choice.
    #[must_use]
    pub fn from_arg(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => Self::auto(),
            ThemeArg::Light => Self::light(),
            ThemeArg::Dark => Self::dark(),
        }
    }

    /// Check if this is the light palette.
    #[must_use]
    pub fn is_light(&self) -> bool {
        self.normal == Color::Black
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// `COLORFGBG` is "fg;bg"; background 7 and 9-15 are light.
fn is_light_terminal() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().and_then(|bg| bg.parse::<u32>().ok()))
        .is_some_and(|bg| bg >= 7 && bg != 8)
}
