//! Color theme preference.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The user's theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system setting.
    #[default]
    System,
}

/// A concrete color scheme, after resolving [`Theme::System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl Theme {
    /// Every theme choice, in display order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    /// The persisted form: `light`, `dark` or `system`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Parse a persisted value, falling back to `System` for anything unknown.
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Resolve to a concrete scheme given the client's preference, if known.
    #[must_use]
    pub const fn resolve(self, prefers_dark: Option<bool>) -> ColorScheme {
        match self {
            Self::Light => ColorScheme::Light,
            Self::Dark => ColorScheme::Dark,
            Self::System => match prefers_dark {
                Some(true) => ColorScheme::Dark,
                _ => ColorScheme::Light,
            },
        }
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(UnknownTheme(s.to_owned())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ColorScheme {
    /// CSS class applied to the document root.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Returned when parsing a theme name that is not `light`, `dark` or `system`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);
