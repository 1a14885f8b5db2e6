//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use fruitcrushtui::FruitKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Fruit colours plus UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// One colour per fruit, indexed by `FruitKind::index`.
    pub fruit: [Color; 8],
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and empty power-up slots.
    pub inactive_fg: Color,
    /// Cursor cell background.
    pub cursor_bg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// One Dark fruit colours: apple, orange, grape, strawberry, kiwi, lemon, peach, cherry.
const ONEDARK_FRUIT: [u32; 8] = [
    0xE0_6C_75, 0xD1_9A_66, 0xC6_78_DD, 0xF0_A6_CA, 0x98_C3_79, 0xE5_C0_7B, 0xF5_B3_8A, 0xBE_50_46,
];

const HIGH_CONTRAST_FRUIT: [u32; 8] = [
    0xFF_00_00, 0xFF_88_00, 0xAA_00_FF, 0xFF_66_CC, 0x00_FF_00, 0xFF_FF_00, 0xFF_CC_99, 0x00_FF_FF,
];

/// Okabe–Ito, with white in place of black for dark backgrounds.
const COLORBLIND_FRUIT: [u32; 8] = [
    0xD5_5E_00, 0xE6_9F_00, 0x00_72_B2, 0xCC_79_A7, 0x00_9E_73, 0xF0_E4_42, 0x56_B4_E9, 0xFF_FF_FF,
];

/// btop keys whose colour is close enough to stand in for a fruit when the theme has no
/// `fruit_<name>` entry.
const BTOP_FALLBACK: [&str; 8] = [
    "cpu_end", "temp_mid", "net_box", "proc_misc", "mem_box", "title", "download_mid", "temp_end",
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            fruit: ONEDARK_FRUIT.map(rgb),
            bg: rgb(0x28_2C_34),
            div_line: rgb(0x3F_44_4F),
            main_fg: rgb(0xAB_B2_BF),
            title: rgb(0xE5_C0_7B),
            inactive_fg: rgb(0x5C_63_70),
            cursor_bg: rgb(0x3E_44_51),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override fruit colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.fruit = HIGH_CONTRAST_FRUIT.map(rgb),
            crate::Palette::Colorblind => self.fruit = COLORBLIND_FRUIT.map(rgb),
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut fruit = defaults.fruit;
        for kind in FruitKind::ALL {
            let i = kind.index();
            if let Some(c) = get(&format!("fruit_{}", kind.name())).or_else(|| get(BTOP_FALLBACK[i])) {
                fruit[i] = c;
            }
        }
        Self {
            fruit,
            bg: get("main_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
            cursor_bg: get("selected_bg").unwrap_or(defaults.cursor_bg),
        }
    }

    #[inline]
    pub fn fruit_color(&self, kind: FruitKind) -> Color {
        self.fruit[kind.index()]
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
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&s[range], 16).map_err(|_| invalid());
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
