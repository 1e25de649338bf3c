//! Hex color parsing

use crate::error::{Error, Result};

/// RGB color with each channel in `0.0..=1.0`, ready for the `rg` operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Parse `#rrggbb` (the `#` is optional) into normalized RGB
///
/// Anything other than exactly six hex digits is rejected; there is no
/// fallback color.
pub fn resolve_color(hex: &str) -> Result<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidColorFormat(hex.to_string()));
    }

    let channel = |i: usize| -> Result<f32> {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|_| Error::InvalidColorFormat(hex.to_string()))
    };

    Ok(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}
