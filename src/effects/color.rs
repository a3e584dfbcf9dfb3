//! Hex colour handling for the `bg` parameter.
//!
//! Image-style backgrounds are entered as `#rgb` / `#rrggbb` hex codes. imgix
//! reads `bg` as 3, 4, 6 or 8 hex digits, where the 4 and 8 digit forms are
//! ARGB. Alpha is kept in the 0–127 range used by image-style toolkits
//! (0 = opaque, 127 = fully transparent) and converted on output, so partial
//! opacities do not survive a parse/render cycle exactly.

use std::fmt;

/// Largest alpha value; fully transparent.
pub const ALPHA_TRANSPARENT: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// 0 (opaque) to 127 (transparent).
    pub alpha: u8,
}

impl Color {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0,
        }
    }

    /// Background used by `rotate` when none is given: transparent white.
    pub const fn transparent_white() -> Self {
        Self {
            red: 255,
            green: 255,
            blue: 255,
            alpha: ALPHA_TRANSPARENT,
        }
    }

    /// Parse a hex colour, with or without a leading `#`.
    ///
    /// Returns `None` for anything that is not 3, 4, 6 or 8 hex digits.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        // Expand shorthand forms (`abc` → `aabbcc`).
        let full: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return None,
        };

        let byte = |i: usize| u8::from_str_radix(&full[i..i + 2], 16).ok();
        let (opacity, rgb_start) = if full.len() == 8 {
            (byte(0)?, 2)
        } else {
            (255, 0)
        };

        Some(Self {
            red: byte(rgb_start)?,
            green: byte(rgb_start + 2)?,
            blue: byte(rgb_start + 4)?,
            alpha: opacity_to_alpha(opacity),
        })
    }

    /// The value imgix expects for `bg`: `rrggbb` when opaque, `aarrggbb`
    /// otherwise.
    pub fn to_imgix_hex(self) -> String {
        if self.alpha == 0 {
            format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        } else {
            format!(
                "{:02x}{:02x}{:02x}{:02x}",
                alpha_to_opacity(self.alpha),
                self.red,
                self.green,
                self.blue
            )
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_imgix_hex())
    }
}

fn alpha_to_opacity(alpha: u8) -> u8 {
    let alpha = alpha.min(ALPHA_TRANSPARENT) as f64;
    ((ALPHA_TRANSPARENT as f64 - alpha) * 255.0 / ALPHA_TRANSPARENT as f64).round() as u8
}

fn opacity_to_alpha(opacity: u8) -> u8 {
    (ALPHA_TRANSPARENT as f64 - opacity as f64 * ALPHA_TRANSPARENT as f64 / 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_with_hash() {
        assert_eq!(Color::parse_hex("#ff00ff"), Some(Color::rgb(255, 0, 255)));
    }

    #[test]
    fn parses_shorthand() {
        assert_eq!(Color::parse_hex("000"), Some(Color::rgb(0, 0, 0)));
        assert_eq!(Color::parse_hex("#fff"), Some(Color::rgb(255, 255, 255)));
    }

    #[test]
    fn parses_argb() {
        assert_eq!(
            Color::parse_hex("00ffffff"),
            Some(Color::transparent_white())
        );
        assert_eq!(Color::parse_hex("ff336699"), Some(Color::rgb(0x33, 0x66, 0x99)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color::parse_hex(""), None);
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("red"), None);
        assert_eq!(Color::parse_hex("#gg0000"), None);
    }

    #[test]
    fn opaque_renders_without_alpha() {
        assert_eq!(Color::rgb(0x33, 0x66, 0x99).to_imgix_hex(), "336699");
    }

    #[test]
    fn transparent_white_renders_as_argb() {
        assert_eq!(Color::transparent_white().to_imgix_hex(), "00ffffff");
    }

    #[test]
    fn imgix_hex_parses_back() {
        for hex in ["336699", "00ffffff", "000000"] {
            let color = Color::parse_hex(hex).unwrap();
            assert_eq!(color.to_imgix_hex(), hex);
        }
    }
}
