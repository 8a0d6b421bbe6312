//! Helvetica glyph metrics and WinAnsi text encoding.
//!
//! The PDF writer uses the two standard Type1 fonts every viewer ships
//! (Helvetica, Helvetica-Bold), so no font program is embedded. Widths come
//! from the Adobe core font AFM files, in 1/1000 em, for ASCII 32..=126.

/// Standard font used for a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// PDF resource name used in content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }
}

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

/// Map accented Latin-1 letters onto the ASCII letter with the same advance.
fn width_proxy(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '¡' => '!',
        '¿' => '?',
        '\u{a0}' => ' ',
        _ => ch,
    }
}

/// Advance width of one character in 1/1000 em.
pub fn char_width(font: Font, ch: char) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let proxy = width_proxy(ch);
    let idx = (proxy as usize).wrapping_sub(32);
    // Anything outside the table is measured as a wide glyph
    table.get(idx).copied().unwrap_or(556)
}

/// Width of `text` set in `font` at `size` points.
pub fn text_width(font: Font, size: f32, text: &str) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(font, c))).sum();
    #[allow(clippy::cast_precision_loss)]
    let units = units as f32;
    units * size / 1000.0
}

/// Break `text` into lines no wider than `max_width`.
///
/// Words wrap at spaces; a single word wider than the line is broken
/// between characters. Empty text yields one empty line so that every
/// cell keeps its height.
pub fn wrap_text(font: Font, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(font, size, &candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(font, size, word) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if text_width(font, size, &current) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Encode text for a simple font using WinAnsiEncoding (Windows-1252).
///
/// Latin-1 maps straight through; the handful of typographic characters
/// Windows-1252 places in 0x80..0x9F are translated; anything else
/// becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(ch)).unwrap_or(b'?'),
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(char_width(Font::Regular, ' '), 278);
        assert_eq!(char_width(Font::Regular, 'W'), 944);
        assert_eq!(char_width(Font::Bold, 'i'), 278);
        assert_eq!(char_width(Font::Regular, '~'), 584);
        assert_eq!(char_width(Font::Regular, 'Ó'), char_width(Font::Regular, 'O'));
    }

    #[test]
    fn test_text_width_scales_with_size() {
        // "AA" in Helvetica is 2 * 667 units
        assert!((text_width(Font::Regular, 10.0, "AA") - 13.34).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_at_spaces() {
        let lines = wrap_text(Font::Regular, 10.0, "NOMBRE DEL RESPONSABLE", 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(Font::Regular, 10.0, line) <= 80.0);
        }
        assert_eq!(lines.join(" "), "NOMBRE DEL RESPONSABLE");
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_text(Font::Regular, 10.0, "ABCDEFGHIJKLMNOP", 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn test_wrap_empty_keeps_one_line() {
        assert_eq!(wrap_text(Font::Bold, 11.0, "", 100.0), vec![String::new()]);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(encode_win_ansi("Impresión"), b"Impresi\xf3n".to_vec());
        assert_eq!(encode_win_ansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(encode_win_ansi("日"), b"?".to_vec());
    }
}
