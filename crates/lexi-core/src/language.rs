use std::collections::HashMap;
use std::sync::Arc;

/// Lemma guesses for a surface form. Implementations live in `languages/*`.
pub trait LemmaCandidates: Send + Sync {
    /// Plausible base forms of `word`, most likely first. `word` is already
    /// normalized; the word itself is not part of the result.
    fn candidates(&self, word: &str, language: &str) -> Vec<String>;
}

/// Dispatches to the provider registered for a language
#[derive(Default, Clone)]
pub struct LemmaRouter {
    providers: HashMap<String, Arc<dyn LemmaCandidates>>,
}

impl LemmaRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, language: &str, provider: Arc<dyn LemmaCandidates>) -> Self {
        self.providers.insert(language.to_lowercase(), provider);
        self
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

impl LemmaCandidates for LemmaRouter {
    fn candidates(&self, word: &str, language: &str) -> Vec<String> {
        let Some(provider) = self.providers.get(&language.to_lowercase()) else {
            return Vec::new();
        };

        let mut seen = Vec::new();
        for candidate in provider.candidates(word, language) {
            if candidate != word && !candidate.is_empty() && !seen.contains(&candidate) {
                seen.push(candidate);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl LemmaCandidates for Echo {
        fn candidates(&self, word: &str, _language: &str) -> Vec<String> {
            vec![word.to_string(), "base".into(), "".into(), "base".into()]
        }
    }

    #[test]
    fn router_dispatches_and_dedups() {
        let router = LemmaRouter::new().register("EN", Arc::new(Echo));
        assert_eq!(router.candidates("words", "en"), vec!["base".to_string()]);
        assert!(router.candidates("words", "ko").is_empty());
        assert_eq!(router.languages(), vec!["en"]);
    }
}
