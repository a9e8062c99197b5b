//! Numeric encoding of classified tag streams
//!
//! Opening-tag names are numbered in first-seen order starting at 1. The
//! vocabulary belongs to a single comparison: when two documents are compared
//! it is built over the union of both so equal names get equal numbers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::classify::{ClassifiedToken, TagKind};

/// Ordered numeric representation of one document
pub type NumericSeries = Vec<f64>;

/// How closing tags contribute to a [`NumericSeries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseEncoding {
    /// A closer emits the negated number of its opening tag, or 0 when that
    /// name was never opened
    #[default]
    Negated,

    /// Every closer emits 0
    Zero,
}

/// Mapping from opening-tag name to a positive integer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagVocabulary {
    ids: HashMap<String, u32>,
}

impl TagVocabulary {
    /// Empty vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary over the opening tags of one or more documents, in
    /// document order
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a [ClassifiedToken]>,
    {
        let mut vocabulary = Self::new();
        for tokens in documents {
            vocabulary.extend(tokens);
        }
        vocabulary
    }

    /// Assign numbers to every opening tag not yet seen
    pub fn extend(&mut self, tokens: &[ClassifiedToken]) {
        for token in tokens.iter().filter(|t| t.kind == TagKind::Open) {
            self.insert(token.name());
        }
    }

    /// Number for `name`, assigning the next one if it is new
    pub fn insert(&mut self, name: &str) -> u32 {
        let next = self.ids.len() as u32 + 1;
        *self.ids.entry(name.to_string()).or_insert(next)
    }

    /// Number assigned to `name`
    pub fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Encode a token stream against `vocabulary`
///
/// Opening tags missing from the vocabulary encode as 0; this only happens
/// when the caller built the vocabulary from other documents.
pub fn encode(
    tokens: &[ClassifiedToken],
    vocabulary: &TagVocabulary,
    close_encoding: CloseEncoding,
) -> NumericSeries {
    tokens
        .iter()
        .map(|token| match token.kind {
            TagKind::Open => vocabulary.get(token.name()).map_or(0.0, f64::from),
            TagKind::Close => match close_encoding {
                CloseEncoding::Negated => vocabulary
                    .get(token.name())
                    .map_or(0.0, |id| -f64::from(id)),
                CloseEncoding::Zero => 0.0,
            },
            TagKind::Comment => 0.0,
        })
        .collect()
}
