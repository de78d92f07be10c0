//! Light and dark color schemes.

use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;

/// The selectable color schemes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colors used by the terminal view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Background of the whole view.
    pub primary: Color,
    /// Background of the message list.
    pub secondary: Color,
    /// User bubbles, the spinner and the focused input border.
    pub accent: Color,
    /// Ordinary text, including bot bubbles.
    pub text: Color,
    /// Time-of-day stamps and hints.
    pub muted: Color,
    /// The error line.
    pub error: Color,
}

const LIGHT: Palette = Palette {
    primary: Color::Rgb(255, 255, 255),
    secondary: Color::Rgb(243, 244, 246),
    accent: Color::Rgb(59, 130, 246),
    text: Color::Rgb(31, 41, 55),
    muted: Color::Rgb(107, 114, 128),
    error: Color::Rgb(239, 68, 68),
};

const DARK: Palette = Palette {
    primary: Color::Rgb(17, 24, 39),
    secondary: Color::Rgb(31, 41, 55),
    accent: Color::Rgb(234, 179, 8),
    text: Color::Rgb(243, 244, 246),
    muted: Color::Rgb(156, 163, 175),
    error: Color::Rgb(248, 113, 113),
};

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => LIGHT,
            Theme::Dark => DARK,
        }
    }

    /// The other theme.
    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected 'light' or 'dark')")),
        }
    }
}
