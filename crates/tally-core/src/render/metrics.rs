//! Glyph advance widths for the standard Helvetica faces.
//!
//! Values are the Adobe core-font metrics (1/1000 em) for printable ASCII.
//! Characters outside that range use the digit width, which is close enough
//! for alignment of names with accents.

use super::layout::Font;

/// Millimetres per PDF point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn glyph_width(ch: char, font: Font) -> u16 {
    let table = match font {
        Font::Bold => &HELVETICA_BOLD,
        // Oblique shares the upright metrics.
        Font::Regular | Font::Italic => &HELVETICA,
    };

    match ch as u32 {
        code @ 32..=126 => table[(code - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Width of `text` in millimetres at `size_pt`.
pub fn text_width(text: &str, font: Font, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(glyph_width(ch, font))).sum();
    units as f32 / 1000.0 * size_pt * MM_PER_PT
}

/// Shortens `text` with a trailing `...` until it fits in `max_width` mm.
pub fn fit_text(text: &str, font: Font, size_pt: f32, max_width: f32) -> String {
    if text_width(text, font, size_pt) <= max_width {
        return text.to_string();
    }

    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if text_width(&candidate, font, size_pt) <= max_width {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_width() {
        // 10 digits at 10pt = 5.56pt per digit.
        let width = text_width("0123456789", Font::Regular, 10.0);
        assert!((width - 55.6 * MM_PER_PT).abs() < 0.001);
    }

    #[test]
    fn test_bold_is_wider() {
        assert!(
            text_width("Lace", Font::Bold, 12.0) > text_width("Lace", Font::Regular, 12.0)
        );
    }

    #[test]
    fn test_fit_text() {
        let long = "Guinea Brocade Premium Extra Wide Double Width";
        let fitted = fit_text(long, Font::Regular, 11.0, 30.0);
        assert!(fitted.ends_with("..."));
        assert!(text_width(&fitted, Font::Regular, 11.0) <= 30.0);

        assert_eq!(fit_text("Lace", Font::Regular, 11.0, 30.0), "Lace");
    }
}
