//! Anonymized submission labels

use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};

/// Anonymized identifier of a submission within one review round (`A`, `B`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Label for the submission at `index` in generation order.
    ///
    /// `0 -> A`, `25 -> Z`, then `AA`, `AB`, ... so labels stay unique for
    /// councils larger than the alphabet.
    pub fn from_index(index: usize) -> Self {
        let mut n = index + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.reverse();
        Self(String::from_utf8_lossy(&letters).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One label assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub label: Label,
    pub model: ModelId,
}

/// Bijection between labels and the submissions of one review round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    entries: Vec<LabelEntry>,
}

impl LabelMap {
    /// Assign `A`, `B`, `C`, ... to `models` in the given order
    pub fn assign<'a>(models: impl IntoIterator<Item = &'a ModelId>) -> Self {
        let entries = models
            .into_iter()
            .enumerate()
            .map(|(i, model)| LabelEntry {
                label: Label::from_index(i),
                model: model.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn labels(&self) -> Vec<Label> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn model_for(&self, label: &Label) -> Option<&ModelId> {
        self.entries
            .iter()
            .find(|e| &e.label == label)
            .map(|e| &e.model)
    }

    /// Label at a given position; positions match the submissions of the round
    pub fn label_at(&self, index: usize) -> Option<&Label> {
        self.entries.get(index).map(|e| &e.label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label.as_str() == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
