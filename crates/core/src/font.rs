//! Font metrics and text encoding for the standard Helvetica font
//!
//! Labels are drawn with the non-embedded base-14 Helvetica font using
//! WinAnsiEncoding, so text is measured with the standard AFM widths and
//! encoded to single bytes before it goes into a `Tj` operator.

/// Width and vertical metrics of a simple single-byte font
pub trait FontMetrics {
    /// PostScript name used for the `/BaseFont` entry
    fn base_font(&self) -> &str;

    /// Advance width of an encoded byte in 1/1000 em
    fn glyph_width(&self, code: u8) -> f64;

    /// Ascender in 1/1000 em
    fn ascender(&self) -> f64;

    /// Descender in 1/1000 em (negative below the baseline)
    fn descender(&self) -> f64;

    /// Width of encoded text in points at `size`
    fn width_of_encoded(&self, encoded: &[u8], size: f64) -> f64 {
        let units: f64 = encoded.iter().map(|b| self.glyph_width(*b)).sum();
        units * size / 1000.0
    }

    /// Full glyph box height (ascender to descender) in points at `size`
    fn height_at_size(&self, size: f64) -> f64 {
        (self.ascender() - self.descender()) * size / 1000.0
    }
}

/// Helvetica AFM widths for codes 32..=126
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space .. /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 .. 9
    278, 278, 584, 584, 584, 556, 1015, // : .. @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A .. M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N .. Z
    278, 278, 278, 469, 556, 333, // [ .. `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a .. m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n .. z
    334, 260, 334, 584, // { .. ~
];

/// Width used for codes above 126, close to the average Latin-1 glyph
const HELVETICA_DEFAULT_WIDTH: f64 = 556.0;

/// The standard Helvetica font
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Helvetica;

impl FontMetrics for Helvetica {
    fn base_font(&self) -> &str {
        "Helvetica"
    }

    fn glyph_width(&self, code: u8) -> f64 {
        match code {
            32..=126 => f64::from(HELVETICA_ASCII_WIDTHS[usize::from(code - 32)]),
            _ => HELVETICA_DEFAULT_WIDTH,
        }
    }

    fn ascender(&self) -> f64 {
        718.0
    }

    fn descender(&self) -> f64 {
        -207.0
    }
}

/// Replacement byte for characters WinAnsiEncoding cannot represent
pub const REPLACEMENT: u8 = b'?';

/// Encode `text` to WinAnsiEncoding
///
/// Line breaks and tabs become spaces. Other characters outside the encoding
/// are replaced with `?` and logged once per call.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut replaced = 0usize;
    let bytes = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => b' ',
            _ => win_ansi_code(c).unwrap_or_else(|| {
                replaced += 1;
                REPLACEMENT
            }),
        })
        .collect();

    if replaced > 0 {
        log::warn!("replaced {} character(s) not representable in WinAnsiEncoding in {:?}", replaced, text);
    }
    bytes
}

fn win_ansi_code(c: char) -> Option<u8> {
    let code = u32::from(c);
    match code {
        0x20..=0x7e | 0xa0..=0xff => u8::try_from(code).ok(),
        _ => {
            let byte = match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8a,
                '‹' => 0x8b,
                'Œ' => 0x8c,
                'Ž' => 0x8e,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9a,
                '›' => 0x9b,
                'œ' => 0x9c,
                'ž' => 0x9e,
                'Ÿ' => 0x9f,
                _ => return None,
            };
            Some(byte)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        let font = Helvetica;
        assert_eq!(font.glyph_width(b' '), 278.0);
        assert_eq!(font.glyph_width(b'@'), 1015.0);
        assert_eq!(font.glyph_width(b'W'), 944.0);
        assert_eq!(font.glyph_width(b'i'), 222.0);
        assert_eq!(font.glyph_width(b'~'), 584.0);
        // "Hi" = 722 + 222
        assert!((font.width_of_encoded(b"Hi", 10.0) - 9.44).abs() < 1e-9);
    }

    #[test]
    fn test_height_at_size() {
        assert!((Helvetica.height_at_size(16.0) - 14.8).abs() < 1e-9);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("10.0 m²"), b"10.0 m\xb2".to_vec());
        assert_eq!(encode_win_ansi("a€b"), vec![b'a', 0x80, b'b']);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("a\nb"), b"a b".to_vec());
    }
}
