use crate::error::{FrameError, FrameResult};

/// Opaque sRGB color used for frame fills and text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};

impl Rgb {
    /// Parse a `#rrggbb` (or bare `rrggbb`) hex string.
    ///
    /// This is the single place malformed color input errors; everything
    /// downstream works on already-decoded channels.
    pub fn from_hex(hex: &str) -> FrameResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FrameError::validation(format!(
                "expected 6-digit hex color, got '{hex}'"
            )));
        }
        let channel = |at: usize| -> FrameResult<u8> {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map_err(|_| FrameError::validation(format!("invalid hex color '{hex}'")))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// WCAG-style relative luminance of an sRGB color, in [0, 1].
pub fn relative_luminance(color: Rgb) -> f64 {
    let linearize = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

/// Pick a readable text color for the given background: black on light
/// backgrounds, white on dark ones.
pub fn resolve_text_color(background: Rgb) -> Rgb {
    if relative_luminance(background) > 0.179 {
        BLACK
    } else {
        WHITE
    }
}

/// Whether a background counts as dark for logo-variant selection.
pub fn is_dark(background: Rgb) -> bool {
    relative_luminance(background) <= 0.179
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_and_prefix() {
        let c = Rgb::from_hex("#1a2b3c").unwrap();
        assert_eq!(c, Rgb { r: 0x1a, g: 0x2b, b: 0x3c });
        assert_eq!(c.to_hex(), "#1a2b3c");
        assert_eq!(Rgb::from_hex("1a2b3c").unwrap(), c);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gggggg").is_err());
        assert!(Rgb::from_hex("").is_err());
        assert!(Rgb::from_hex("#1a2b3c4d").is_err());
    }

    #[test]
    fn text_color_is_black_or_white_only() {
        for hex in ["#ffffff", "#000000", "#808080", "#123456", "#ff0000"] {
            let bg = Rgb::from_hex(hex).unwrap();
            let fg = resolve_text_color(bg);
            assert!(fg == BLACK || fg == WHITE, "unexpected color for {hex}");
            // Deterministic across calls.
            assert_eq!(fg, resolve_text_color(bg));
        }
    }

    #[test]
    fn light_backgrounds_get_black_text() {
        assert_eq!(resolve_text_color(WHITE), BLACK);
        assert_eq!(resolve_text_color(Rgb::from_hex("#808080").unwrap()), BLACK);
    }

    #[test]
    fn dark_backgrounds_get_white_text() {
        assert_eq!(resolve_text_color(BLACK), WHITE);
        assert_eq!(resolve_text_color(Rgb::from_hex("#123456").unwrap()), WHITE);
    }

    #[test]
    fn darkness_matches_text_resolution() {
        for hex in ["#ffffff", "#000000", "#123456", "#fafafa"] {
            let bg = Rgb::from_hex(hex).unwrap();
            assert_eq!(is_dark(bg), resolve_text_color(bg) == WHITE);
        }
    }
}
