use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalizes a mention name so that surface variants of the same entity
/// compare equal: diacritics and punctuation are dropped, case is folded and
/// whitespace collapsed.
///
/// # Arguments
/// - `name`: The surface form as found in the text.
///
/// # Returns
/// - The normalized value, possibly empty.
pub fn normalize_name(name: &str) -> String {
    basic_normalize(name, true)
}

/// Cleans free text before tokenization. Same treatment as
/// [`normalize_name`], except digit sequences are removed as well.
pub fn normalize_text(text: &str) -> String {
    basic_normalize(text, false)
}

fn basic_normalize(text: &str, keep_digits: bool) -> String {
    text.nfkd() // Unicode normalization
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .replace(
            |c: char| !(c.is_alphabetic() || (keep_digits && c.is_numeric())),
            " ",
        )
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
