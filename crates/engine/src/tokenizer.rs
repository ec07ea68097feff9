use crate::timeline::Token;

/// Split narration into word tokens. Punctuation stays attached to its word.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .enumerate()
        .map(|(ordinal, word)| Token {
            text: word.to_string(),
            ordinal,
        })
        .collect()
}
