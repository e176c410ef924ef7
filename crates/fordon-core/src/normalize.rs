//! Text normalization for OCR and PDF text layers.
//!
//! [`normalize`] cleans the text that values are captured from; it keeps
//! case and digits intact. [`fold_label`] builds the case-insensitive,
//! punctuation-free key that labels are compared with.

/// UTF-8 text decoded as Latin-1, as produced by some PDF generators.
const MOJIBAKE: [(&str, &str); 6] = [
    ("Ã¥", "å"),
    ("Ã¸", "ø"),
    ("Ã¦", "æ"),
    ("Ã…", "Å"),
    ("Ã˜", "Ø"),
    ("Ã†", "Æ"),
];

/// Punctuation OCR likes to drop into the middle of words.
const STRAY_PUNCTUATION: [char; 5] = ['\'', '`', '´', '¨', '·'];

/// Glyphs OCR emits between table entries.
const SEPARATOR_GLYPHS: [char; 4] = ['©', '®', '•', '¦'];

/// Normalize raw document text for pattern matching.
///
/// Unifies line endings, repairs mojibake of Norwegian letters, turns
/// exotic spaces and OCR separator glyphs into plain spaces, removes stray
/// punctuation between two letters, collapses horizontal whitespace, trims
/// lines and drops blank ones. Digit sequences are never altered.
///
/// The function is idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let mut text: String = text
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| !is_zero_width(*c))
        .map(|c| if c == '\r' { '\n' } else { c })
        .collect();

    for (broken, fixed) in MOJIBAKE {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }

    let chars: Vec<char> = text
        .chars()
        .map(|c| {
            if c != '\n' && (c.is_whitespace() || SEPARATOR_GLYPHS.contains(&c)) {
                ' '
            } else {
                c
            }
        })
        .collect();

    let cleaned = remove_stray_punctuation(&chars);

    cleaned
        .lines()
        .map(compact_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of whitespace into one space and trim the ends.
pub fn compact_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for labels: lower-case ASCII letters and digits only.
///
/// `"Årlig kjøre-lengde:"` and `"arlig kjorelengde"` fold to the same key.
pub fn fold_label(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text.chars() {
        push_folded(c, &mut key);
    }
    key
}

/// Append the folded form of `c` to `key` (possibly nothing).
pub(crate) fn push_folded(c: char, key: &mut String) {
    for lower in c.to_lowercase() {
        match lower {
            'æ' => key.push_str("ae"),
            'ø' | 'ö' | 'ó' | 'ò' | 'ô' => key.push('o'),
            'å' | 'ä' | 'á' | 'à' | 'â' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'ü' | 'ú' | 'ù' => key.push('u'),
            'í' | 'ì' | 'ï' => key.push('i'),
            c if c.is_alphanumeric() => key.push(c),
            _ => {}
        }
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{feff}' | '\u{ad}')
}

/// Drop stray punctuation whose neighbours on both sides are letters.
///
/// Neighbours are taken from the input, so `"a´b´c"` loses both marks and
/// a run such as `"a´´b"` is left alone.
fn remove_stray_punctuation(chars: &[char]) -> String {
    chars
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            if !STRAY_PUNCTUATION.contains(c) {
                return true;
            }
            let before = i.checked_sub(1).map(|j| chars[j]);
            let after = chars.get(i + 1).copied();
            !matches!((before, after), (Some(b), Some(a)) if b.is_alphabetic() && a.is_alphabetic())
        })
        .map(|(_, c)| *c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Kjennemerke:\t\tKR3037  \r\n\r\n\u{00a0}Type:   Varetilhenger\n   \n";
        assert_eq!(normalize(raw), "Kjennemerke: KR3037\nType: Varetilhenger");
    }

    #[test]
    fn test_normalize_keeps_case_and_digits() {
        assert_eq!(normalize("Forsikringssum kr: 20 000"), "Forsikringssum kr: 20 000");
        assert_eq!(normalize("VOLKSWAGEN TRANSPORTER 2020 BU 21895"), "VOLKSWAGEN TRANSPORTER 2020 BU 21895");
    }

    #[test]
    fn test_normalize_repairs_mojibake() {
        assert_eq!(normalize("Fabrikat/Ã¥rsmodell"), "Fabrikat/årsmodell");
        assert_eq!(normalize("KjÃ¸relengde"), "Kjørelengde");
        assert_eq!(normalize("MASKINLÃ˜SÃ˜RE"), "MASKINLØSØRE");
    }

    #[test]
    fn test_normalize_strips_ocr_artifacts() {
        assert_eq!(normalize("Kjenne´merke: AB12345"), "Kjennemerke: AB12345");
        assert_eq!(normalize("Egen'an`del: 4 000"), "Egenandel: 4 000");
        assert_eq!(normalize("Doosan 300 © Hitachi 300"), "Doosan 300 Hitachi 300");
        assert_eq!(normalize("Bo\u{200b}nus: 70%"), "Bonus: 70%");
        // Marks next to digits are not inside a word.
        assert_eq!(normalize("12´000"), "12´000");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "",
            "\n\n",
            "  a´b´c  ´d  ",
            "a´´b",
            "Ã\u{200b}¥rlig",
            "Kasko © PAU18255 \t 20 000\r\n6 000",
            "Ã´¥ x¦y ®",
            "line one\r\rline two\u{feff}",
            "Årlig kjørelengde:\u{2009}15 000 km",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_fold_label() {
        assert_eq!(fold_label("Årlig kjøre-lengde:"), "arligkjorelengde");
        assert_eq!(fold_label("ARLIG KJORELENGDE"), "arligkjorelengde");
        assert_eq!(fold_label("Reg.nr"), "regnr");
        assert_eq!(fold_label("Tredjemannsinteresse/leasing"), "tredjemannsinteresseleasing");
        assert_eq!(fold_label("Kj0relengde"), "kj0relengde");
    }

    #[test]
    fn test_compact_spaces() {
        assert_eq!(compact_spaces("  Volvo   XC60\t2020 "), "Volvo XC60 2020");
    }
}
