//! Token-budgeted text splitting.
//!
//! Words are the atomic units: a chunk never splits a word, and a word that
//! alone exceeds the budget is emitted as its own oversized chunk.

use std::str::SplitWhitespace;

use crate::types::{GuideError, Result};

/// Split `text` into space-joined chunks whose measured length stays within
/// `chunk_tokens`.
///
/// Fails before producing anything when `chunk_tokens` is zero. The returned
/// iterator is lazy and holds no cache; call again to split again.
///
/// Every candidate chunk is measured whole, so `token_len` need not be
/// additive over words (the chars and code estimators are not). The cost is
/// quadratic in the words per chunk.
pub fn smart_split<F>(text: &str, chunk_tokens: usize, token_len: F) -> Result<SmartSplit<'_, F>>
where
    F: Fn(&str) -> usize,
{
    if chunk_tokens == 0 {
        return Err(GuideError::InvalidArgument(
            "chunk_tokens must be a positive integer".to_string(),
        ));
    }

    Ok(SmartSplit {
        words: text.split_whitespace(),
        pending: None,
        chunk_tokens,
        token_len,
    })
}

pub struct SmartSplit<'a, F> {
    words: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    chunk_tokens: usize,
    token_len: F,
}

impl<F> Iterator for SmartSplit<'_, F>
where
    F: Fn(&str) -> usize,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut current = String::new();

        while let Some(word) = self.pending.take().or_else(|| self.words.next()) {
            if current.is_empty() {
                current.push_str(word);
                if (self.token_len)(&current) > self.chunk_tokens {
                    return Some(current);
                }
                continue;
            }

            let rollback = current.len();
            current.push(' ');
            current.push_str(word);
            if (self.token_len)(&current) > self.chunk_tokens {
                current.truncate(rollback);
                self.pending = Some(word);
                return Some(current);
            }
        }

        if current.is_empty() { None } else { Some(current) }
    }
}
