use iced::{Color, Font};
use tracing::warn;

use crate::config::StyleConfig;

pub const FONT: Font = Font::with_name("Cascadia Mono");

pub const MUTED_GLYPH: &str = "\u{1f507}";
pub const UNMUTED_GLYPH: &str = "\u{1f50a}";

const FALLBACK_BACKGROUND: Color = Color::BLACK;
const FALLBACK_FOREGROUND: Color = Color::WHITE;
const FALLBACK_TROUGH: Color = Color::from_rgb(0.2, 0.2, 0.2);
const FALLBACK_BAR: Color = Color::from_rgb(0.0, 0.866, 1.0);

/// Resolved overlay colors. Config carries hex strings; anything unparseable
/// falls back to the built-in scheme with a warning.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub trough: Color,
    pub bar: Color,
}

impl Palette {
    pub fn from_config(style: &StyleConfig) -> Self {
        Self {
            background: resolve(&style.background, FALLBACK_BACKGROUND),
            foreground: resolve(&style.foreground, FALLBACK_FOREGROUND),
            trough: resolve(&style.trough, FALLBACK_TROUGH),
            bar: resolve(&style.bar, FALLBACK_BAR),
        }
    }
}

fn resolve(hex: &str, fallback: Color) -> Color {
    match parse_hex(hex) {
        Some(color) => color,
        None => {
            warn!("invalid color '{hex}', using fallback");
            fallback
        }
    }
}

/// Parses `#rrggbb` into a Color.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Color::from_rgb8(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_valid() {
        let color = parse_hex("#00ddff").unwrap();
        assert_eq!(color, Color::from_rgb8(0x00, 0xdd, 0xff));

        let grey = parse_hex("#333333").unwrap();
        assert_eq!(grey, Color::from_rgb8(0x33, 0x33, 0x33));
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        assert!(parse_hex("00ddff").is_none());
        assert!(parse_hex("#00ddf").is_none());
        assert!(parse_hex("#00ddfff").is_none());
        assert!(parse_hex("#zzddff").is_none());
        assert!(parse_hex("").is_none());
    }

    #[test]
    fn test_palette_falls_back_on_bad_config() {
        let style = StyleConfig {
            bar: "turquoise".to_string(),
            ..StyleConfig::default()
        };

        let palette = Palette::from_config(&style);
        assert_eq!(palette.bar, FALLBACK_BAR);
        assert_eq!(palette.trough, Color::from_rgb8(0x33, 0x33, 0x33));
    }

    #[test]
    fn test_palette_from_defaults() {
        let palette = Palette::from_config(&StyleConfig::default());
        assert_eq!(palette.background, Color::from_rgb8(0, 0, 0));
        assert_eq!(palette.bar, Color::from_rgb8(0x00, 0xdd, 0xff));
    }
}
