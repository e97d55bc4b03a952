//! Query and corpus tokenization
//!
//! Lowercase, strip everything that isn't alphanumeric or whitespace, split
//! on whitespace, and drop single-character tokens. The same tokenizer runs
//! over the corpus at index-build time and over queries at search time, so
//! both sides see identical vocabularies.

/// Tokenize a name or query string.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|token| token.len() > 1)
        .map(str::to_string)
        .collect()
}
