//! Normalized RGB colors
//!
//! Shapes on the editing surface store colors as `#rrggbb` strings. The export
//! path converts them once into normalized (0.0 to 1.0) channels, which is what
//! the `rg`/`RG` content-stream operators expect.

use std::fmt;
use std::str::FromStr;

/// Error parsing a hex color string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color {0:?}, expected #rrggbb")]
    InvalidHex(String),
}

/// RGB color with channels normalized to 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: RgbColor = RgbColor { r: 0.0, g: 0.0, b: 0.0 };

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channels
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
        }
    }

    /// Parse a `#rrggbb` string
    ///
    /// The 24-bit value is split into three 8-bit channels by shifting, then
    /// each channel is divided by 255. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(hex.to_string()));
        }

        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorError::InvalidHex(hex.to_string()))?;
        let r = ((value >> 16) & 0xff) as u8;
        let g = ((value >> 8) & 0xff) as u8;
        let b = (value & 0xff) as u8;

        Ok(Self::from_u8(r, g, b))
    }

    /// Format back to `#rrggbb`
    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", channel(self.r), channel(self.g), channel(self.b))
    }

    pub fn components(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for RgbColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        let color = RgbColor::from_hex("#3388ff").unwrap();
        assert_eq!(color.r, f64::from(0x33) / 255.0);
        assert_eq!(color.g, f64::from(0x88) / 255.0);
        assert_eq!(color.b, f64::from(0xff) / 255.0);
    }

    #[test]
    fn test_hex_without_hash() {
        assert_eq!(RgbColor::from_hex("ff0000").unwrap(), RgbColor::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_hex() {
        assert!(RgbColor::from_hex("#12345").is_err());
        assert!(RgbColor::from_hex("#zzzzzz").is_err());
        assert!(RgbColor::from_hex("red").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let color: RgbColor = "#3388ff".parse().unwrap();
        assert_eq!(color.to_hex(), "#3388ff");
    }
}
