//! Keyword + page text → model inputs.
//!
//! The split is deliberately naive: lowercase, then cut on a fixed set of
//! ASCII delimiters. Newlines and tabs are not delimiters. No truncation or
//! padding is applied, so N is whatever the text produces.

use crate::vocab::Vocabulary;
use serde::Serialize;

const DELIMITERS: [char; 5] = [' ', '.', ',', '!', '?'];

/// Three parallel sequences of length N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    /// All ones: every position is real content.
    pub attention_mask: Vec<i64>,
    /// All zeros: single-segment input.
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Non-empty fragments of `text` (expected already lowercased).
pub fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(&DELIMITERS[..]).filter(|t| !t.is_empty())
}

pub fn encode(vocab: &Vocabulary, keyword: &str, page_text: &str) -> EncodedInput {
    let joined = format!("{keyword} {page_text}").to_lowercase();
    let input_ids: Vec<i64> = split_tokens(&joined).map(|t| vocab.id(t)).collect();
    let n = input_ids.len();
    EncodedInput {
        input_ids,
        attention_mask: vec![1; n],
        token_type_ids: vec![0; n],
    }
}
