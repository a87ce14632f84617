use std::sync::Arc;

use lexi_core::{CascadeHit, EntryMetadata, LemmaCandidates, clean_word, normalize_word};
use lexi_hub::{DictionaryHub, HubError};
use lexi_translator::{Definer, Definition};
use tokio::sync::RwLock;

use crate::vocabulary::Vocabulary;

/// Shown when no stage could define a word
pub const UNAVAILABLE_PLACEHOLDER: &str = "(definition unavailable)";

/// Another dictionary's take on the same word
#[derive(Debug, Clone, PartialEq)]
pub struct Alternate {
    pub source_name: String,
    pub priority: i64,
    pub translation: String,
    pub metadata: EntryMetadata,
}

impl From<&CascadeHit> for Alternate {
    fn from(hit: &CascadeHit) -> Self {
        Self {
            source_name: hit.source.name.clone(),
            priority: hit.source.priority,
            translation: hit.entry.translation.clone(),
            metadata: hit.entry.metadata.clone(),
        }
    }
}

/// Outcome of a waterfall lookup, named after the stage that answered
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The word is already in the learner's vocabulary
    AlreadyKnown { word: String },
    /// Exact-word cascade hit; `alternates` holds every hit, winner included
    Dictionary {
        word: String,
        winner: CascadeHit,
        alternates: Vec<Alternate>,
    },
    /// Hit on a lemma candidate; `root` is the candidate that matched
    Lemma {
        word: String,
        root: String,
        winner: CascadeHit,
        alternates: Vec<Alternate>,
    },
    Ai {
        word: String,
        definition: Definition,
        saved: bool,
    },
    /// Nothing answered; `placeholder` is what the UI shows instead
    Unavailable {
        word: String,
        reason: String,
        placeholder: String,
    },
    /// Nothing left after cleaning
    Empty,
}

impl Resolution {
    pub fn word(&self) -> Option<&str> {
        match self {
            Resolution::AlreadyKnown { word }
            | Resolution::Dictionary { word, .. }
            | Resolution::Lemma { word, .. }
            | Resolution::Ai { word, .. }
            | Resolution::Unavailable { word, .. } => Some(word),
            Resolution::Empty => None,
        }
    }

    /// Winning translation and where it came from
    pub fn translation(&self) -> Option<(&str, &str)> {
        match self {
            Resolution::Dictionary { winner, .. } | Resolution::Lemma { winner, .. } => {
                Some((winner.entry.translation.as_str(), winner.source.name.as_str()))
            }
            Resolution::Ai { definition, .. } => {
                Some((definition.translation.as_str(), definition.provider.as_str()))
            }
            _ => None,
        }
    }
}

/// memory vocabulary → exact cascade → lemma cascade → AI definer.
///
/// Cheaper stages run first and the first stage with an answer wins.
#[derive(Clone)]
pub struct WaterfallResolver {
    hub: DictionaryHub,
    vocabulary: Arc<RwLock<Vocabulary>>,
    lemmas: Arc<dyn LemmaCandidates>,
    definer: Option<Arc<dyn Definer>>,
    persist_results: bool,
}

impl WaterfallResolver {
    pub fn new(
        hub: DictionaryHub,
        vocabulary: Arc<RwLock<Vocabulary>>,
        lemmas: Arc<dyn LemmaCandidates>,
        definer: Option<Arc<dyn Definer>>,
        persist_results: bool,
    ) -> Self {
        Self {
            hub,
            vocabulary,
            lemmas,
            definer,
            persist_results,
        }
    }

    /// Resolve a word captured from running text. Store failures propagate;
    /// definer failures degrade to [`Resolution::Unavailable`].
    pub async fn resolve(
        &self,
        raw: &str,
        context: &str,
        language: &str,
    ) -> Result<Resolution, HubError> {
        let word = clean_word(raw);
        if word.is_empty() {
            return Ok(Resolution::Empty);
        }

        if self.vocabulary.read().await.contains(language, &word) {
            tracing::debug!("'{}' already in vocabulary", word);
            return Ok(Resolution::AlreadyKnown { word });
        }

        let hits = self.hub.lookup_cascade(language, &word).await?;
        if let Some(winner) = hits.first().cloned() {
            return Ok(Resolution::Dictionary {
                word,
                winner,
                alternates: hits.iter().map(Alternate::from).collect(),
            });
        }

        let key = normalize_word(&word);
        for root in self.lemmas.candidates(&key, language) {
            let hits = self.hub.lookup_cascade(language, &root).await?;
            if let Some(winner) = hits.first().cloned() {
                tracing::debug!("'{}' resolved through lemma '{}'", word, root);
                return Ok(Resolution::Lemma {
                    word,
                    root,
                    winner,
                    alternates: hits.iter().map(Alternate::from).collect(),
                });
            }
        }

        self.ask_definer(word, context, language).await
    }

    async fn ask_definer(
        &self,
        word: String,
        context: &str,
        language: &str,
    ) -> Result<Resolution, HubError> {
        let Some(definer) = &self.definer else {
            return Ok(unavailable(word, "no definer configured".to_string()));
        };

        let definition = match definer.define(&word, context, language).await {
            Ok(definition) => definition,
            Err(e) => {
                tracing::warn!(
                    "Definer '{}' failed for '{}': {}",
                    definer.metadata().name,
                    word,
                    e
                );
                return Ok(unavailable(word, e.to_string()));
            }
        };

        let mut saved = false;
        if self.persist_results {
            match self
                .hub
                .save_user_definition(
                    language,
                    &word,
                    &definition.translation,
                    definition.metadata.clone(),
                )
                .await
            {
                Ok(_) => saved = true,
                Err(e) => tracing::warn!("Could not save definition of '{}': {}", word, e),
            }
        }

        Ok(Resolution::Ai {
            word,
            definition,
            saved,
        })
    }
}

fn unavailable(word: String, reason: String) -> Resolution {
    Resolution::Unavailable {
        word,
        reason,
        placeholder: UNAVAILABLE_PLACEHOLDER.to_string(),
    }
}
