//! CSS hex colors.
//!
//! Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (case-insensitive). Colors
//! without an alpha component are fully opaque, so `#d3d3d3` matches the
//! opaque light-grey land pixels of the base maps exactly.

use image::Rgba;

use crate::error::ColorError;

/// Parse a CSS hex color into an RGBA pixel.
pub fn parse_hex(value: &str) -> Result<Rgba<u8>, ColorError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('#')
        .ok_or_else(|| ColorError::MissingHash(value.to_string()))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::BadDigit(value.to_string()));
    }

    let channel = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|_| ColorError::BadDigit(value.to_string()))
    };

    match digits.len() {
        3 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, c) in digits.chars().enumerate() {
                let nibble = channel(&c.to_string())?;
                out[i] = nibble * 17;
            }
            Ok(Rgba(out))
        }
        6 => Ok(Rgba([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
            255,
        ])),
        8 => Ok(Rgba([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
            channel(&digits[6..8])?,
        ])),
        _ => Err(ColorError::BadLength(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_colors_as_opaque() {
        assert_eq!(parse_hex("#d3d3d3").unwrap(), Rgba([0xd3, 0xd3, 0xd3, 255]));
        assert_eq!(parse_hex("#F60B2A").unwrap(), Rgba([0xf6, 0x0b, 0x2a, 255]));
    }

    #[test]
    fn parses_short_and_alpha_forms() {
        assert_eq!(parse_hex("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex("#a0b").unwrap(), Rgba([0xaa, 0x00, 0xbb, 255]));
        assert_eq!(parse_hex("#00000080").unwrap(), Rgba([0, 0, 0, 0x80]));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_hex("  #000000 ").unwrap(), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert_eq!(
            parse_hex("d3d3d3"),
            Err(ColorError::MissingHash("d3d3d3".to_string()))
        );
        assert_eq!(
            parse_hex("#d3d3"),
            Err(ColorError::BadLength("#d3d3".to_string()))
        );
        assert_eq!(
            parse_hex("#gggggg"),
            Err(ColorError::BadDigit("#gggggg".to_string()))
        );
    }
}
