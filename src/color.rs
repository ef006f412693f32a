//! RGB colors as the surfaces consume them.

use serde::{Deserialize, Serialize};

use crate::attributes::Value;
use crate::error::{PlumeError, Result};

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`.
    pub fn hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| {
            u8::from_str_radix(s, 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|_| PlumeError::InvalidArgument(format!("invalid color \"{}\"", hex)))
        };

        match digits.len() {
            3 => Ok(Self {
                r: channel(&digits[0..1].repeat(2))?,
                g: channel(&digits[1..2].repeat(2))?,
                b: channel(&digits[2..3].repeat(2))?,
            }),
            6 => Ok(Self {
                r: channel(&digits[0..2])?,
                g: channel(&digits[2..4])?,
                b: channel(&digits[4..6])?,
            }),
            _ => Err(PlumeError::InvalidArgument(format!(
                "invalid color \"{}\"",
                hex
            ))),
        }
    }

    /// Parse a color name or hex string.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            "red" => Ok(Color::rgb(1.0, 0.0, 0.0)),
            "green" => Ok(Color::rgb(0.0, 0.5, 0.0)),
            "blue" => Ok(Color::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => Ok(Color::rgb(0.5, 0.5, 0.5)),
            "yellow" => Ok(Color::rgb(1.0, 1.0, 0.0)),
            _ => Color::hex(value),
        }
    }

    /// Read a color out of an attribute value. `null` means "no color".
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Text(s) => Color::parse(s).map(Some),
            other => Err(PlumeError::InvalidArgument(format!(
                "expected a color string, got \"{}\"",
                other
            ))),
        }
    }
}
