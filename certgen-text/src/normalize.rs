//! Name normalization: turns raw input lines into display strings.
//!
//! Latin names are proper-cased (`"dhruv SAIDAVA"` → `"Dhruv Saidava"`).
//! Scripts without case (Gujarati, CJK, …) pass through untouched apart
//! from trimming and NFC composition, which keeps conjunct lookups in the
//! shaper working on canonical sequences.

use certgen_core::NameEntry;
use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};

/// Case behaviour of a string, decided once per name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptCase {
    /// Every letter is Latin; proper-casing applies.
    LatinCased,
    /// At least one letter from a script without Latin casing, or no
    /// letters at all.
    NoCaseScript,
}

impl ScriptCase {
    pub fn detect(text: &str) -> Self {
        let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
        if letters.peek().is_none() {
            return Self::NoCaseScript;
        }
        if letters.all(|c| c.script() == Script::Latin) {
            Self::LatinCased
        } else {
            Self::NoCaseScript
        }
    }
}

/// Normalize one raw line for display.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match ScriptCase::detect(trimmed) {
        ScriptCase::LatinCased => proper_case(trimmed),
        ScriptCase::NoCaseScript => trimmed.nfc().collect(),
    }
}

/// First letter of each whitespace-separated token upper-cased, the rest
/// lower-cased, tokens re-joined with single spaces.
fn proper_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            push_titlecase(&mut out, first);
            for c in chars {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

/// Title-case one character: `ß` becomes `Ss` and `ﬁ` becomes `Fi`, so a
/// second pass leaves the result unchanged.
fn push_titlecase(out: &mut String, c: char) {
    let mut upper = c.to_uppercase();
    if let Some(head) = upper.next() {
        out.push(head);
    }
    for rest in upper {
        out.extend(rest.to_lowercase());
    }
}

/// Split multi-line input into entries.
///
/// Lines are trimmed, blank lines dropped, and indices assigned in input
/// order. With `sort`, entries are ordered by display text first (indices
/// then follow the sorted order).
pub fn parse_names(input: &str, sort: bool) -> Vec<NameEntry> {
    let mut pairs: Vec<(String, String)> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| (line.to_string(), normalize(line)))
        .collect();

    if sort {
        pairs.sort_by(|a, b| a.1.cmp(&b.1));
    }

    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (raw, display))| NameEntry::new(index, raw, display))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proper_case() {
        assert_eq!(normalize("dhruv saidava"), "Dhruv Saidava");
        assert_eq!(normalize("  JOHN   o'brien  "), "John O'brien");
        assert_eq!(normalize("éLODIE"), "Élodie");
    }

    #[test]
    fn test_multi_char_uppercase_is_title_cased() {
        assert_eq!(normalize("ßa"), "Ssa");
        assert_eq!(normalize("ﬁona smith"), "Fiona Smith");
    }

    #[test]
    fn test_idempotent_latin() {
        for input in [
            "dhruv saidava",
            "ALL CAPS NAME",
            "mIxEd\tcase",
            "Ünal  Şahin",
            "x",
            "ßa",
            "ﬁona",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_gujarati_passthrough() {
        let name = "ગોર શશીકાંત મહેન્દ્રભાઈ રાવલ";
        assert_eq!(ScriptCase::detect(name), ScriptCase::NoCaseScript);
        assert_eq!(normalize(name), name);
        assert_eq!(normalize(&format!("  {name}\t")), name);
    }

    #[test]
    fn test_cjk_passthrough() {
        assert_eq!(normalize("山田 太郎"), "山田 太郎");
    }

    #[test]
    fn test_mixed_script_is_not_cased() {
        let mixed = "ravi રાવલ";
        assert_eq!(ScriptCase::detect(mixed), ScriptCase::NoCaseScript);
        assert_eq!(normalize(mixed), mixed);
    }

    #[test]
    fn test_no_letters() {
        assert_eq!(ScriptCase::detect("1234"), ScriptCase::NoCaseScript);
        assert_eq!(normalize("  1234 "), "1234");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_nfc_composition() {
        // "e" + COMBINING ACUTE in a non-Latin context is composed.
        let decomposed = "ક e\u{301}";
        assert_eq!(normalize(decomposed), "ક \u{e9}");
    }

    #[test]
    fn test_parse_names_keeps_order() {
        let entries = parse_names("zoe adams\n\n  bob\r\n   \nalice\n", false);
        let display: Vec<_> = entries.iter().map(|e| e.display.as_str()).collect();
        assert_eq!(display, ["Zoe Adams", "Bob", "Alice"]);
        let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(entries[1].raw, "bob");
    }

    #[test]
    fn test_parse_names_sorted() {
        let entries = parse_names("zoe\nbob\nalice", true);
        let display: Vec<_> = entries.iter().map(|e| e.display.as_str()).collect();
        assert_eq!(display, ["Alice", "Bob", "Zoe"]);
        assert_eq!(entries[0].index, 0);
    }
}
