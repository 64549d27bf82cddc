//! Text decoding strategies for delimited input of unknown encoding.
//!
//! The loader walks a fixed list of [`Decoder`]s. Candidates are strict: a
//! malformed byte sequence rejects the candidate outright. Decoded text that
//! parses is then scored with [`TextQuality`] to catch the case where bytes
//! happen to be valid in the wrong encoding and come out as mojibake.

use std::{borrow::Cow, sync::OnceLock};

use encoding_rs::{EUC_JP, Encoding, ISO_2022_JP, SHIFT_JIS, UTF_8};
use regex::Regex;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Maximum share of corrupt characters relative to Japanese characters.
pub const JAPANESE_CORRUPT_RATIO: f64 = 0.10;
/// Maximum share of corrupt characters relative to all sampled characters
/// when no Japanese text was found.
pub const PLAIN_CORRUPT_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Fails on any malformed byte sequence.
    Strict(&'static Encoding),
    /// Substitutes U+FFFD for malformed sequences.
    Permissive(&'static Encoding),
}

impl Decoder {
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            Decoder::Strict(encoding) | Decoder::Permissive(encoding) => encoding,
        }
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match *self {
            Decoder::Strict(encoding) => {
                let bytes = strip_bom(bytes, encoding);
                encoding.decode_without_bom_handling_and_without_replacement(bytes)
            }
            Decoder::Permissive(encoding) => {
                let bytes = strip_bom(bytes, encoding);
                let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
                Some(text)
            }
        }
    }
}

fn strip_bom<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> &'a [u8] {
    if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    }
}

/// The fixed candidate order. Content never reorders it.
pub fn candidate_decoders() -> [Decoder; 4] {
    [
        Decoder::Strict(UTF_8),
        Decoder::Strict(SHIFT_JIS),
        Decoder::Strict(EUC_JP),
        Decoder::Strict(ISO_2022_JP),
    ]
}

/// Decoders to try, without the quality check, once every candidate has been
/// rejected.
pub fn fallback_decoders(bytes: &[u8]) -> Vec<Decoder> {
    if looks_like_shift_jis(bytes) {
        vec![Decoder::Permissive(SHIFT_JIS)]
    } else {
        vec![Decoder::Strict(UTF_8), Decoder::Permissive(SHIFT_JIS)]
    }
}

/// Last resort: UTF-8 with replacement characters.
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _had_errors) = UTF_8.decode_with_bom_removal(bytes);
    text
}

/// True when the input is not UTF-8 and contains at least one Shift_JIS
/// lead/trail byte pair.
pub fn looks_like_shift_jis(bytes: &[u8]) -> bool {
    if std::str::from_utf8(strip_bom(bytes, UTF_8)).is_ok() {
        return false;
    }
    bytes
        .windows(2)
        .any(|pair| is_shift_jis_lead(pair[0]) && is_shift_jis_trail(pair[1]))
}

fn is_shift_jis_lead(byte: u8) -> bool {
    matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
}

fn is_shift_jis_trail(byte: u8) -> bool {
    matches!(byte, 0x40..=0x7E | 0x80..=0xFC)
}

fn question_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\?{2,}").expect("static pattern compiles"))
}

/// Character counts used to decide whether decoded text is plausible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextQuality {
    pub japanese: usize,
    pub corrupt: usize,
    pub total: usize,
}

impl TextQuality {
    pub fn measure(text: &str) -> Self {
        let mut quality = TextQuality::default();
        for ch in text.chars() {
            quality.total += 1;
            if is_japanese(ch) {
                quality.japanese += 1;
            } else if is_corruption_marker(ch) {
                quality.corrupt += 1;
            }
        }
        quality.corrupt += question_runs()
            .find_iter(text)
            .map(|m| m.as_str().len())
            .sum::<usize>();
        quality
    }

    pub fn corrupt_ratio(&self) -> f64 {
        let base = if self.japanese > 0 {
            self.japanese
        } else {
            self.total
        };
        if base == 0 {
            0.0
        } else {
            self.corrupt as f64 / base as f64
        }
    }

    pub fn is_acceptable(&self) -> bool {
        let threshold = if self.japanese > 0 {
            JAPANESE_CORRUPT_RATIO
        } else {
            PLAIN_CORRUPT_RATIO
        };
        self.corrupt_ratio() < threshold
    }
}

pub fn is_japanese(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{3400}'..='\u{4DBF}'
        | '\u{FF66}'..='\u{FF9F}' // half-width katakana
    )
}

/// Replacement characters, box placeholders, private-use code points (which
/// render as boxes) and stray control characters. ISO-2022 escapes count too,
/// but a mostly-ASCII sample with a few short Japanese runs stays under
/// [`PLAIN_CORRUPT_RATIO`] and is accepted as UTF-8.
pub fn is_corruption_marker(ch: char) -> bool {
    matches!(ch, '\u{FFFD}' | '\u{25A1}' | '\u{E000}'..='\u{F8FF}')
        || (ch.is_control() && !matches!(ch, '\t' | '\n' | '\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_keep_fixed_order() {
        let names: Vec<&str> = candidate_decoders()
            .iter()
            .map(|d| d.encoding().name())
            .collect();
        assert_eq!(names, vec!["UTF-8", "Shift_JIS", "EUC-JP", "ISO-2022-JP"]);
    }

    #[test]
    fn strict_decoder_rejects_malformed_bytes() {
        let (sjis, _, _) = SHIFT_JIS.encode("山田");
        assert!(Decoder::Strict(UTF_8).decode(&sjis).is_none());
        assert_eq!(
            Decoder::Strict(SHIFT_JIS).decode(&sjis).as_deref(),
            Some("山田")
        );
    }

    #[test]
    fn strict_utf8_strips_byte_order_mark() {
        let bytes = b"\xEF\xBB\xBFemail\n";
        assert_eq!(
            Decoder::Strict(UTF_8).decode(bytes).as_deref(),
            Some("email\n")
        );
    }

    #[test]
    fn permissive_decoder_substitutes_replacement_characters() {
        let text = Decoder::Permissive(SHIFT_JIS)
            .decode(b"ab\xFFcd")
            .expect("permissive always decodes");
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn shift_jis_signature_ignores_valid_utf8() {
        let (sjis, _, _) = SHIFT_JIS.encode("顧客名");
        assert!(looks_like_shift_jis(&sjis));
        assert!(!looks_like_shift_jis("顧客名".as_bytes()));
        assert!(!looks_like_shift_jis(b"plain ascii"));
    }

    #[test]
    fn quality_counts_question_mark_runs() {
        let quality = TextQuality::measure("a??b?c");
        assert_eq!(quality.corrupt, 2);
        assert_eq!(quality.total, 6);
    }

    #[test]
    fn quality_uses_japanese_count_as_base_when_present() {
        let text = format!("{}{}", "山".repeat(20), "\u{FFFD}");
        let quality = TextQuality::measure(&text);
        assert_eq!(quality.japanese, 20);
        assert!(quality.is_acceptable());

        let text = format!("{}{}", "山".repeat(5), "\u{FFFD}");
        assert!(!TextQuality::measure(&text).is_acceptable());
    }

    #[test]
    fn quality_uses_total_length_without_japanese() {
        let clean = format!("{}\u{FFFD}", "a".repeat(30));
        assert!(TextQuality::measure(&clean).is_acceptable());
        let noisy = format!("{}\u{FFFD}", "a".repeat(10));
        assert!(!TextQuality::measure(&noisy).is_acceptable());
    }

    #[test]
    fn quality_flags_escape_sequences() {
        assert!(is_corruption_marker('\u{1b}'));
        assert!(!is_corruption_marker('\n'));
        assert!(TextQuality::measure("").is_acceptable());
    }
}
