//! Token Counting
//!
//! Provides token estimation used as the chunker's measuring function.
//!
//! ## Estimators
//! - `words`: one token per whitespace-delimited word (exact for the chunker's units)
//! - `chars`: 4 characters = 1 token, good for general English text
//! - `code`: punctuation-aware estimate, closer to BPE counts on serialized JSON

use serde::{Deserialize, Serialize};

/// Token estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEstimator {
    /// One token per whitespace-delimited word
    #[default]
    Words,
    /// Simple character-based estimation (4 chars = 1 token)
    Chars,
    /// Code-aware estimation (punctuation counted separately)
    Code,
}

impl std::fmt::Display for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenEstimator::Words => "words",
            TokenEstimator::Chars => "chars",
            TokenEstimator::Code => "code",
        };
        write!(f, "{}", s)
    }
}

/// Token counter for chunk budgeting
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter {
    estimator: TokenEstimator,
}

impl TokenCounter {
    pub fn new(estimator: TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Estimate token count for a string
    pub fn count(&self, text: &str) -> usize {
        match self.estimator {
            TokenEstimator::Words => text.split_whitespace().count(),
            TokenEstimator::Chars => text.chars().count().div_ceil(4),
            TokenEstimator::Code => Self::count_code_aware(text),
        }
    }

    fn count_code_aware(text: &str) -> usize {
        let mut tokens = 0;
        let mut word_len = 0;

        for ch in text.chars() {
            match ch {
                '(' | ')' | '{' | '}' | '[' | ']' | ';' | ':' | ',' | '.' | '+' | '-' | '*'
                | '/' | '=' | '<' | '>' | '!' | '&' | '|' | '@' | '#' | '$' | '%' | '^' | '~'
                | '?' | '\\' | '"' => {
                    tokens += Self::word_tokens(word_len);
                    word_len = 0;
                    tokens += 1;
                }
                c if c.is_whitespace() => {
                    tokens += Self::word_tokens(word_len);
                    word_len = 0;
                }
                c => word_len += c.len_utf8(),
            }
        }

        tokens + Self::word_tokens(word_len)
    }

    fn word_tokens(len: usize) -> usize {
        match len {
            0 => 0,
            1..=4 => 1,
            5..=8 => 2,
            _ => len.div_ceil(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_counting() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("select *  from\nt"), 4);
    }

    #[test]
    fn test_char_based_counting() {
        let counter = TokenCounter::new(TokenEstimator::Chars);
        assert_eq!(counter.count("hello"), 2);
        assert_eq!(counter.count("hi"), 1);
        assert_eq!(counter.count("hello world"), 3);
    }

    #[test]
    fn test_code_aware_counting() {
        let counter = TokenCounter::new(TokenEstimator::Code);
        assert_eq!(counter.count(""), 0);

        let small = counter.count(r#"{"doc_id": "s-1"}"#);
        assert!(small > 0);

        let large = counter.count(
            r#"{"doc_id": "s-1", "columns": [{"name": "ad_id", "type": "bigint"}]}"#,
        );
        assert!(large > small);
    }

    #[test]
    fn test_estimator_serde() {
        let e: TokenEstimator = serde_json::from_str("\"code\"").unwrap();
        assert_eq!(e, TokenEstimator::Code);
        assert_eq!(TokenEstimator::default().to_string(), "words");
    }
}
