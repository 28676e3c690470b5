// SPDX-License-Identifier: MIT
//! # Name Normalization
//!
//! Canonicalizes a raw OCR line into the key used everywhere else:
//!
//! 1. drop every `(...)` annotation, parentheses included
//! 2. drop every character that is not an ASCII letter, ASCII digit or whitespace
//! 3. collapse whitespace runs to a single space and trim
//! 4. lowercase
//!
//! Two lines with the same normalized form are the same entry. There is no
//! positional tie-break, so genuinely duplicated display names collapse
//! into one key.

/// Normalize a raw display line into a lookup key.
///
/// An unmatched `(` is not an annotation opener; it is removed by the
/// character filter like any other punctuation.
pub fn normalize_name(raw: &str) -> String {
    let stripped = strip_parentheticals(raw);
    let kept: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Remove each `(` together with everything up to the next `)`.
fn strip_parentheticals(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_annotation() {
        assert_eq!(normalize_name("Jane (Home)"), "jane");
        assert_eq!(normalize_name("Jane (Home) Doe (Work)"), "jane doe");
    }

    #[test]
    fn test_strips_punctuation_and_collapses_space() {
        assert_eq!(normalize_name("  O'Brien,   Pat!! "), "obrien pat");
        assert_eq!(normalize_name("Mom\t\t2"), "mom 2");
    }

    #[test]
    fn test_unmatched_paren_is_just_punctuation() {
        assert_eq!(normalize_name("Jane (Home"), "jane home");
        assert_eq!(normalize_name("Jane) Doe"), "jane doe");
    }

    #[test]
    fn test_nested_parens_close_at_first_closer() {
        assert_eq!(normalize_name("a (b (c) d) e"), "a d e");
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(normalize_name("José"), "jos");
        assert_eq!(normalize_name("İlker"), "lker");
    }

    #[test]
    fn test_blank_and_symbol_only_lines_normalize_to_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("(Me)"), "");
        assert_eq!(normalize_name("• — •"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Jane (Home)",
            "  O'Brien,   Pat!! ",
            "a (b (c) d) e",
            "José (iPhone) ÅSA",
            "((()))",
            "Jane (Home",
            "ALL CAPS 123",
            "tab\tand\nnewline",
        ];
        for raw in samples {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {raw:?}");
        }
    }
}
