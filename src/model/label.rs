//! Labels and their colors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EditorError;

/// A validated `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Build from RGB components.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02x}{g:02x}{b:02x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// RGB components.
    pub fn rgb(&self) -> [u8; 3] {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        [channel(1), channel(3), channel(5)]
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &HexColor) -> f64 {
        let [r1, g1, b1] = self.rgb();
        let [r2, g2, b2] = other.rgb();
        let d = |a: u8, b: u8| (f64::from(a) - f64::from(b)).powi(2);
        (d(r1, r2) + d(g1, g2) + d(b1, b2)).sqrt()
    }
}

impl From<[u8; 3]> for HexColor {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::from_rgb(r, g, b)
    }
}

impl FromStr for HexColor {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == 7
            && s.starts_with('#')
            && s[1..].chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(EditorError::invalid_color(s))
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-defined annotation category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: HexColor,
}

impl Label {
    pub fn new(name: impl Into<String>, color: HexColor) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Parse the color from a hex string.
    pub fn parse(name: impl Into<String>, color: &str) -> Result<Self, EditorError> {
        Ok(Self::new(name, color.parse()?))
    }
}

// ============================================================================
// Color generation
// ============================================================================

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// HSV to a hex color.
pub fn hsv_to_hex(h: f64, s: f64, v: f64) -> HexColor {
    let (r, g, b) = hsv_to_rgb(h, s, v);
    let to_u8 = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    HexColor::from_rgb(to_u8(r), to_u8(g), to_u8(b))
}

/// Golden angle in degrees; successive hues never line up.
const GOLDEN_ANGLE: f64 = 137.508;

/// A bright color for the `index`-th label.
pub fn label_color(index: usize) -> HexColor {
    let hue = (index as f64 * GOLDEN_ANGLE) % 360.0;
    let saturation = 0.7 + 0.3 * ((index % 3) as f64 / 2.0);
    let value = 0.8 + 0.2 * ((index % 2) as f64);
    hsv_to_hex(hue, saturation, value)
}

/// First generated color at least `min_distance` away from all `existing`.
///
/// Falls back to the next color in sequence once the palette is exhausted.
pub fn distinct_color(existing: &[HexColor], min_distance: f64) -> HexColor {
    const ATTEMPTS: usize = 1000;
    let start = existing.len();
    (start..start + ATTEMPTS)
        .map(label_color)
        .find(|candidate| existing.iter().all(|c| c.distance(candidate) > min_distance))
        .unwrap_or_else(|| label_color(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_color() {
        let c: HexColor = "#FF8800".parse().unwrap();
        assert_eq!(c.rgb(), [255, 136, 0]);
        assert_eq!(c.as_str(), "#FF8800");
    }

    #[test]
    fn test_parse_invalid_color() {
        for bad in ["FF8800", "#FF88", "#GG0000", "#FF88000"] {
            assert!(bad.parse::<HexColor>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_serde_validates() {
        let label: Label = serde_json::from_str(r##"{"name":"car","color":"#00ff00"}"##).unwrap();
        assert_eq!(label.color.rgb(), [0, 255, 0]);
        assert!(serde_json::from_str::<Label>(r#"{"name":"car","color":"green"}"#).is_err());
    }

    #[test]
    fn test_hsv_to_hex_primaries() {
        assert_eq!(hsv_to_hex(0.0, 1.0, 1.0).as_str(), "#ff0000");
        assert_eq!(hsv_to_hex(120.0, 1.0, 1.0).as_str(), "#00ff00");
        assert_eq!(hsv_to_hex(240.0, 1.0, 1.0).as_str(), "#0000ff");
    }

    #[test]
    fn test_distinct_color_keeps_distance() {
        let mut palette = Vec::new();
        for _ in 0..6 {
            let next = distinct_color(&palette, 60.0);
            assert!(palette.iter().all(|c: &HexColor| c.distance(&next) > 60.0));
            palette.push(next);
        }
    }
}
