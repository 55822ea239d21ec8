//! Colours, themes and palettes

use std::fmt;
use std::str::FromStr;

/// Opaque sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from a `0xRRGGBB` literal
    pub const fn from_u32(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Parses `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_u32),
            3 => {
                let value = u16::from_str_radix(digits, 16).ok()?;
                let expand = |nibble: u16| ((nibble & 0xf) as u8) * 17;
                Some(Self::new(expand(value >> 8), expand(value >> 4), expand(value)))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_skia(&self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Named UI theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette::LIGHT,
            Theme::Dark => Palette::DARK,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Colours used by the canvas and the window chrome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub app_bg: Rgb,
    pub card_bg: Rgb,
    pub text_fg: Rgb,
    pub muted_fg: Rgb,
    pub accent: Rgb,
    pub card_border: Rgb,
    pub canvas_bg: Rgb,
    pub actor_fill: Rgb,
    pub actor_outline: Rgb,
    pub actor_text: Rgb,
    pub label_fg: Rgb,
    pub index_fg: Rgb,
    pub preview_line: Rgb,
    pub lifeline: Rgb,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        app_bg: Rgb::from_u32(0xf5f7fa),
        card_bg: Rgb::from_u32(0xffffff),
        text_fg: Rgb::from_u32(0x111827),
        muted_fg: Rgb::from_u32(0x6b7280),
        accent: Rgb::from_u32(0x4a90e2),
        card_border: Rgb::from_u32(0xe6e9ef),
        canvas_bg: Rgb::from_u32(0xffffff),
        actor_fill: Rgb::from_u32(0xf0f0ff),
        actor_outline: Rgb::from_u32(0x000000),
        actor_text: Rgb::from_u32(0x111111),
        label_fg: Rgb::from_u32(0x222222),
        index_fg: Rgb::from_u32(0x666666),
        preview_line: Rgb::from_u32(0x999999),
        lifeline: Rgb::from_u32(0x888888),
    };

    pub const DARK: Palette = Palette {
        app_bg: Rgb::from_u32(0x111217),
        card_bg: Rgb::from_u32(0x111217),
        text_fg: Rgb::from_u32(0xe6eef6),
        muted_fg: Rgb::from_u32(0x9aa3ad),
        accent: Rgb::from_u32(0x4a90e2),
        card_border: Rgb::from_u32(0x0b1116),
        canvas_bg: Rgb::from_u32(0x111217),
        actor_fill: Rgb::from_u32(0x181b22),
        actor_outline: Rgb::from_u32(0x262a31),
        actor_text: Rgb::from_u32(0xe6eef6),
        label_fg: Rgb::from_u32(0xe6eef6),
        index_fg: Rgb::from_u32(0x9aa3ad),
        preview_line: Rgb::from_u32(0x6b7280),
        lifeline: Rgb::from_u32(0x2f3440),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Palette::LIGHT
    }
}
