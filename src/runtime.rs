// Copyright (c) 2026 rezky_nightky

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Green,
    Cyan,
    Magenta,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Green, Theme::Cyan, Theme::Magenta];

    pub fn next(self) -> Theme {
        match self {
            Theme::Green => Theme::Cyan,
            Theme::Cyan => Theme::Magenta,
            Theme::Magenta => Theme::Green,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Green => "green",
            Theme::Cyan => "cyan",
            Theme::Magenta => "magenta",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "matrix" => Ok(Theme::Green),
            "cyan" | "ice" => Ok(Theme::Cyan),
            "magenta" | "pink" => Ok(Theme::Magenta),
            _ => Err(format!("invalid theme: {} (green, cyan, magenta)", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_cycle_visits_every_theme() {
        let mut t = Theme::Green;
        let mut seen = Vec::new();
        for _ in 0..Theme::ALL.len() {
            seen.push(t);
            t = t.next();
        }
        assert_eq!(t, Theme::Green);
        assert_eq!(seen, Theme::ALL.to_vec());
    }

    #[test]
    fn theme_parses_aliases() {
        assert_eq!("Matrix".parse::<Theme>(), Ok(Theme::Green));
        assert_eq!(" pink ".parse::<Theme>(), Ok(Theme::Magenta));
        assert!("plaid".parse::<Theme>().is_err());
    }
}
