//! Stock normalizers.
//!
//! A normalizer maps a raw word to the form stored in (and looked up from) a
//! dictionary, or `None` to exclude the word. Any `Fn(&str) -> Option<String>`
//! works; these two cover the common cases.

/// Keep every word as is.
pub fn identity(word: &str) -> Option<String> {
    Some(word.to_owned())
}

/// Trim surrounding whitespace and lowercase. Blank words are excluded.
pub fn lowercase(word: &str) -> Option<String> {
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    Some(word.to_lowercase())
}
