//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::engine::config::PALETTE_SIZE;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Neon piece palette in unlock order.
const NEON: [Color; PALETTE_SIZE] = [
    Color::Rgb(0xED, 0x1C, 0x24), // red
    Color::Rgb(0x22, 0xB1, 0x4C), // green
    Color::Rgb(0x3F, 0x48, 0xCC), // blue
    Color::Rgb(0xFF, 0xF2, 0x00), // yellow
    Color::Rgb(0xFF, 0x7F, 0x27), // orange
    Color::Rgb(0xB5, 0xE6, 0x1D), // lime
    Color::Rgb(0xFF, 0x00, 0xFF), // magenta
    Color::Rgb(0x00, 0xFF, 0xFF), // cyan
    Color::Rgb(0x99, 0x00, 0xFF), // violet
    Color::Rgb(0x00, 0xFF, 0x99), // mint
];

#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours, indexed by palette slot.
    pub pieces: [Color; PALETTE_SIZE],
    /// Arena background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, stats).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Locked colours, hints.
    pub inactive_fg: Color,
    /// Game-over line and overflow bursts.
    pub danger: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon()
    }
}

impl Theme {
    pub fn neon() -> Self {
        Self {
            pieces: NEON,
            bg: Color::Rgb(0x19, 0x15, 0x3A),
            div_line: Color::Rgb(0x4B, 0x3F, 0x8C),
            main_fg: Color::Rgb(0xE6, 0xE1, 0xFF),
            title: Color::Rgb(0x00, 0xFF, 0xFF),
            inactive_fg: Color::Rgb(0x6C, 0x66, 0x94),
            danger: Color::Rgb(0xFF, 0x33, 0x66),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Piece colours use keys `color0` to `color9`; missing keys keep the neon defaults.
    /// Falls back to the defaults if path is None or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::neon();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (i, slot) in theme.pieces.iter_mut().enumerate() {
            if let Some(c) = get(format!("color{i}").as_str())? {
                *slot = c;
            }
        }
        let ui = [
            ("main_bg", &mut theme.bg),
            ("div_line", &mut theme.div_line),
            ("main_fg", &mut theme.main_fg),
            ("title", &mut theme.title),
            ("inactive_fg", &mut theme.inactive_fg),
            ("danger", &mut theme.danger),
        ];
        for (key, slot) in ui {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        Ok(theme)
    }

    /// Piece colour for a palette index; wraps past the palette size.
    #[inline]
    pub fn piece_color(&self, index: u8) -> Color {
        self.pieces[usize::from(index) % PALETTE_SIZE]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#ED1C24").unwrap();
        assert!(matches!(c, Color::Rgb(0xED, 0x1C, 0x24)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GG0000"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#19153A""##);
        assert_eq!(map.get("main_bg"), Some(&"#19153A".to_string()));
    }

    #[test]
    fn test_partial_theme_keeps_defaults() {
        let map = parse_theme_file(
            r##"
# neon variant
theme[color3]='#123456'
theme[title]="#FFF"
"##,
        );
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.pieces[3], Color::Rgb(0x12, 0x34, 0x56));
        assert_eq!(theme.title, Color::Rgb(255, 255, 255));
        assert_eq!(theme.pieces[0], NEON[0]);
        assert_eq!(theme.bg, Theme::neon().bg);
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let map = parse_theme_file(r#"theme[color0]="not-a-colour""#);
        assert!(Theme::from_map(&map).is_err());
    }

    #[test]
    fn test_piece_color_wraps() {
        let theme = Theme::neon();
        assert_eq!(theme.piece_color(12), theme.pieces[2]);
    }
}
