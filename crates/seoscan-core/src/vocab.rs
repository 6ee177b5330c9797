//! Token vocabulary: one token per line, id = zero-based line index.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Reserved token every vocabulary must carry; unknown tokens map to it.
pub const UNK_TOKEN: &str = "[UNK]";

#[derive(Debug, Clone)]
pub struct Vocabulary {
    ids: HashMap<String, i64>,
    unk_id: i64,
}

impl Vocabulary {
    /// Read a newline-delimited vocabulary file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read vocabulary {}: {e}", path.display()))
        })?;
        let vocab = Self::from_lines(raw.lines())?;
        tracing::debug!(path = %path.display(), tokens = vocab.len(), "vocabulary loaded");
        Ok(vocab)
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut ids = HashMap::new();
        for (idx, token) in lines.into_iter().enumerate() {
            let id = idx as i64;
            if ids.insert(token.to_string(), id).is_some() {
                return Err(Error::Configuration(format!(
                    "duplicate vocabulary token {token:?} on line {}",
                    idx + 1
                )));
            }
        }
        let unk_id = *ids
            .get(UNK_TOKEN)
            .ok_or_else(|| Error::Configuration(format!("vocabulary has no {UNK_TOKEN} entry")))?;
        Ok(Self { ids, unk_id })
    }

    pub fn unk_id(&self) -> i64 {
        self.unk_id
    }

    /// Id for `token`, or the `[UNK]` id when the token is not in the vocabulary.
    pub fn id(&self, token: &str) -> i64 {
        self.ids.get(token).copied().unwrap_or(self.unk_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
