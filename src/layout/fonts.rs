//! Standard Type1 fonts used for drawing values: metrics and encoding.
//!
//! Helvetica and its bold/oblique variants are encoded with WinAnsiEncoding;
//! ZapfDingbats uses its built-in encoding. Widths are in 1/1000 em and are
//! indexed by encoded byte, from the Adobe AFM files.

use crate::error::{Error, Result};

/// One of the standard fonts the generator embeds by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    /// Helvetica
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-Oblique
    HelveticaOblique,
    /// Helvetica-BoldOblique
    HelveticaBoldOblique,
    /// ZapfDingbats
    ZapfDingbats,
}

impl StandardFont {
    /// Helvetica variant for a weight and slant.
    pub fn for_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => StandardFont::HelveticaBoldOblique,
            (true, false) => StandardFont::HelveticaBold,
            (false, true) => StandardFont::HelveticaOblique,
            (false, false) => StandardFont::Helvetica,
        }
    }

    /// PostScript name for `/BaseFont`.
    pub fn base_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// `/Encoding` entry, if the font takes one.
    pub fn encoding_name(&self) -> Option<&'static str> {
        match self {
            StandardFont::ZapfDingbats => None,
            _ => Some("WinAnsiEncoding"),
        }
    }

    fn widths(&self) -> &'static [u16; 256] {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                &HELVETICA_BOLD_WIDTHS
            }
            StandardFont::ZapfDingbats => &ZAPF_DINGBATS_WIDTHS,
        }
    }

    /// Encode one character, or `None` if this font has no glyph for it.
    pub fn encode_char(&self, ch: char) -> Option<u8> {
        let code = match self {
            StandardFont::ZapfDingbats => dingbat_code(ch)?,
            _ => win_ansi_code(ch)?,
        };
        (self.widths()[code as usize] > 0).then_some(code)
    }

    /// Whether every character of `text` can be encoded.
    pub fn can_encode(&self, text: &str) -> bool {
        text.chars().all(|ch| self.encode_char(ch).is_some())
    }

    /// Encode text to single-byte codes.
    ///
    /// Fails with [`Error::Encoding`] naming the first character without a
    /// glyph.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        text.chars()
            .map(|ch| {
                self.encode_char(ch).ok_or_else(|| {
                    Error::Encoding(format!(
                        "{} cannot encode '{}' (U+{:04X})",
                        self.base_name(),
                        ch,
                        ch as u32
                    ))
                })
            })
            .collect()
    }

    /// Advance width of encoded bytes at a size, in points.
    pub fn width_of_codes(&self, codes: &[u8], size: f64) -> f64 {
        let widths = self.widths();
        let units: u32 = codes.iter().map(|&c| u32::from(widths[c as usize])).sum();
        f64::from(units) * size / 1000.0
    }

    /// Advance width of text at a size, in points.
    pub fn width_of_text(&self, text: &str, size: f64) -> Result<f64> {
        Ok(self.width_of_codes(&self.encode(text)?, size))
    }
}

fn win_ansi_code(ch: char) -> Option<u8> {
    let cp = ch as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, code)| *code),
    }
}

fn dingbat_code(ch: char) -> Option<u8> {
    if ch == ' ' {
        return Some(0x20);
    }
    DINGBATS.iter().find(|(c, _)| *c == ch).map(|(_, code)| *code)
}

/// WinAnsiEncoding codes 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Marks usable as a check glyph, with their ZapfDingbats codes.
const DINGBATS: [(char, u8); 12] = [
    ('\u{2701}', 0x21),
    ('\u{2605}', 0x48),
    ('\u{2713}', 0x33),
    ('\u{2714}', 0x34),
    ('\u{2715}', 0x35),
    ('\u{2716}', 0x36),
    ('\u{2717}', 0x37),
    ('\u{2718}', 0x38),
    ('\u{25CF}', 0x6C),
    ('\u{25A0}', 0x6E),
    ('\u{25C6}', 0x75),
    ('\u{2756}', 0x76),
];

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

#[rustfmt::skip]
static ZAPF_DINGBATS_WIDTHS: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 974, 961, 974, 980, 719, 789, 790, 791, 690, 960, 939, 549, 855, 911, 933,
    911, 945, 974, 755, 846, 762, 761, 571, 677, 763, 760, 759, 754, 494, 552, 537,
    577, 692, 786, 788, 788, 790, 793, 794, 816, 823, 789, 841, 823, 833, 816, 831,
    923, 744, 723, 749, 790, 792, 695, 776, 768, 792, 759, 707, 708, 682, 701, 826,
    815, 789, 789, 707, 687, 696, 689, 786, 787, 713, 791, 785, 791, 873, 761, 762,
    762, 759, 759, 892, 892, 788, 784, 438, 138, 277, 415, 392, 392, 668, 668, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 732, 544, 544, 910, 667, 760, 760, 776, 595, 694, 626, 788, 788, 788, 788,
    788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788,
    788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788,
    788, 788, 788, 788, 894, 838, 1016, 458, 748, 924, 748, 918, 927, 928, 928, 834,
    873, 828, 924, 924, 917, 930, 931, 463, 883, 836, 836, 867, 867, 696, 696, 874,
    0, 874, 760, 946, 771, 865, 771, 888, 967, 888, 831, 873, 927, 970, 918, 0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_style() {
        assert_eq!(StandardFont::for_style(false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_style(true, true).base_name(), "Helvetica-BoldOblique");
        assert_eq!(StandardFont::ZapfDingbats.encoding_name(), None);
    }

    #[test]
    fn test_win_ansi_encoding() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.encode("Aé€").unwrap(), vec![0x41, 0xE9, 0x80]);
        assert_eq!(font.encode("“hi”").unwrap(), vec![0x93, b'h', b'i', 0x94]);
        assert!(matches!(font.encode("中"), Err(Error::Encoding(_))));
        assert!(!font.can_encode("tab\there"));
    }

    #[test]
    fn test_helvetica_widths() {
        // "AB" = 667 + 667
        let w = StandardFont::Helvetica.width_of_text("AB", 10.0).unwrap();
        assert!((w - 13.34).abs() < 1e-9);
        let bold = StandardFont::HelveticaBold.width_of_text("AB", 10.0).unwrap();
        assert!((bold - 14.44).abs() < 1e-9);
        let oblique = StandardFont::HelveticaOblique.width_of_text("AB", 10.0).unwrap();
        assert_eq!(w, oblique);
    }

    #[test]
    fn test_heavy_check_mark() {
        let font = StandardFont::ZapfDingbats;
        assert_eq!(font.encode("\u{2714}").unwrap(), vec![0x34]);
        let w = font.width_of_text("\u{2714}", 10.0).unwrap();
        assert!((w - 8.46).abs() < 1e-9);
        assert!(font.encode("X").is_err());
    }
}
