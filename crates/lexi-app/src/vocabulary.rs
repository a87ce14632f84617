use std::collections::HashMap;

use lexi_core::{normalize_word, now_millis};
use serde::{Deserialize, Serialize};

/// A word the learner has saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub word: String,
    pub language: String,
    pub translation: String,
    /// Name of the dictionary or definer that supplied the translation
    pub origin: String,
    pub added_at: i64,
}

/// In-memory vocabulary, one item per `(language, normalized word)`
#[derive(Debug, Default)]
pub struct Vocabulary {
    items: HashMap<(String, String), VocabularyItem>,
}

fn key(language: &str, word: &str) -> (String, String) {
    (language.trim().to_lowercase(), normalize_word(word))
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, language: &str, word: &str) -> bool {
        self.items.contains_key(&key(language, word))
    }

    pub fn get(&self, language: &str, word: &str) -> Option<&VocabularyItem> {
        self.items.get(&key(language, word))
    }

    /// Add a word unless it is already present. Returns whether it was added.
    pub fn add(&mut self, language: &str, word: &str, translation: &str, origin: &str) -> bool {
        let key = key(language, word);
        if key.1.is_empty() || self.items.contains_key(&key) {
            return false;
        }
        let item = VocabularyItem {
            word: word.trim().to_string(),
            language: key.0.clone(),
            translation: translation.to_string(),
            origin: origin.to_string(),
            added_at: now_millis(),
        };
        self.items.insert(key, item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of one language, oldest first
    pub fn items(&self, language: &str) -> Vec<&VocabularyItem> {
        let language = language.trim().to_lowercase();
        let mut items: Vec<_> = self.items.values().filter(|i| i.language == language).collect();
        items.sort_by_key(|i| i.added_at);
        items
    }
}
