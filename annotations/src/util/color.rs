// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Hex color helpers for tag colors
//!
//! Tag colors are stored as `#RRGGBB` strings. These helpers parse and
//! normalize user input so the files on disk stay in one canonical form.

/// Parse a `#RRGGBB` color into its components
///
/// # Arguments
/// * `value` - Color string, leading `#` required, case-insensitive
///
/// # Returns
/// * `Some((r, g, b))` - Red, Green, Blue components (0-255)
/// * `None` - The value is not a six digit hex color
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let digits = value.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Format components as an upper-case `#RRGGBB` string
pub fn format_hex_color(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Normalize a color to upper-case `#RRGGBB`, or `None` when it does not parse
pub fn normalize_hex_color(value: &str) -> Option<String> {
    parse_hex_color(value).map(|(r, g, b)| format_hex_color(r, g, b))
}

pub fn is_hex_color(value: &str) -> bool {
    parse_hex_color(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("#80ff7f"), Some((128, 255, 127)));
        assert_eq!(parse_hex_color(" #000000 "), Some((0, 0, 0)));
    }

    #[test]
    fn test_parse_hex_color_rejects_malformed() {
        assert_eq!(parse_hex_color("FF0000"), None);
        assert_eq!(parse_hex_color("#F00"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
        assert_eq!(parse_hex_color("#FF00001"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn test_normalize_hex_color_uppercases() {
        assert_eq!(normalize_hex_color("#a0b1c2"), Some("#A0B1C2".to_string()));
        assert_eq!(normalize_hex_color("red"), None);
        assert!(is_hex_color("#808080"));
    }
}
