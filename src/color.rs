//! Hex colour parsing and the default palette.

use image::Rgb;

use crate::error::{Error, Result};

/// Multiplier to expand hex shorthand digits (`f` becomes `ff`).
const HEX_SHORTHAND_MULTIPLIER: u8 = 17;

/// Default ink and stamp colour (`#CC0000`).
pub const STAMP_RED: Rgb<u8> = Rgb([0xCC, 0x00, 0x00]);

/// Default ink colour for handwritten signatures (`#000080`).
pub const SIGNATURE_NAVY: Rgb<u8> = Rgb([0x00, 0x00, 0x80]);

/// Colour of the drawing-surface guides.
pub const GUIDE_GRAY: Rgb<u8> = Rgb([0xCC, 0xCC, 0xCC]);

/// Parse a hex colour string.
///
/// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb`, case-insensitive.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] for any other length or a non-hex digit.
pub fn parse_hex_color(text: &str) -> Result<Rgb<u8>> {
    let hex = text.trim().trim_start_matches('#');
    let invalid = || Error::InvalidColor(text.to_string());

    if !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
    };

    match hex.len() {
        3 => Ok(Rgb([
            channel(0..1)? * HEX_SHORTHAND_MULTIPLIER,
            channel(1..2)? * HEX_SHORTHAND_MULTIPLIER,
            channel(2..3)? * HEX_SHORTHAND_MULTIPLIER,
        ])),
        6 => Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?])),
        _ => Err(invalid()),
    }
}

/// Format a colour as lowercase `#rrggbb`.
#[must_use]
pub fn to_hex(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}
