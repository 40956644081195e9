//! Frozen label vocabulary mapping label strings to internal keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Label ↔ key mapping built once from training labels.
///
/// Keys are assigned in first-occurrence order and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build the vocabulary from the distinct labels of a training set.
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::fit_encode(labels).0
    }

    /// Build the vocabulary and return the key of every input label, in input
    /// order.
    pub fn fit_encode<'a, I>(labels: I) -> (Self, Vec<usize>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocab = Self::from(Vec::new());
        let mut keys = Vec::new();
        for label in labels {
            let key = match vocab.index.get(label) {
                Some(&key) => key,
                None => {
                    let key = vocab.labels.len();
                    vocab.index.insert(label.to_string(), key);
                    vocab.labels.push(label.to_string());
                    key
                }
            };
            keys.push(key);
        }
        (vocab, keys)
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, key: usize) -> Result<&str, ModelError> {
        self.labels
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ModelError::ModelLoad(format!("label key {key} out of range")))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<Vec<String>> for LabelVocabulary {
    fn from(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, label)| (label, idx))
            .collect();
        Self { labels, index }
    }
}

impl From<LabelVocabulary> for Vec<String> {
    fn from(vocab: LabelVocabulary) -> Self {
        vocab.labels
    }
}
