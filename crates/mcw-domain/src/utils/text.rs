//! Text helpers for retrieval and context budgeting.

use crate::constants::CHARS_PER_TOKEN;

/// Approximate token count using the constant cost-per-character model.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Lowercased alphanumeric terms, in order of appearance.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// The first `n` sentences of a text, with sentence breaks at `.`, `!`,
/// `?`, or a blank line. Returns the whole text when it has fewer breaks.
#[must_use]
pub fn first_sentences(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let mut found = 0;
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        let is_break = matches!(*b, b'.' | b'!' | b'?')
            || (*b == b'\n' && bytes.get(i + 1) == Some(&b'\n'));
        if is_break {
            found += 1;
            if found == n {
                return text[..=i].trim_end();
            }
        }
    }
    text.trim_end()
}
