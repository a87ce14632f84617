use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lexi_config::hub::HubConfig;
use lexi_core::{BloomFilter, EntryMetadata, LemmaCandidates, NewEntry, SourceKind};
use lexi_hub::DictionaryHub;
use lexi_store::Store;
use lexi_translator::{DefineError, Definer, DefinerMetadata, Definition};
use tokio::sync::RwLock;

use crate::vocabulary::Vocabulary;
use crate::waterfall::{Resolution, UNAVAILABLE_PLACEHOLDER, WaterfallResolver};

type Calls = Arc<Mutex<Vec<String>>>;

struct RecordingLemmas {
    calls: Calls,
    roots: Vec<&'static str>,
}

impl LemmaCandidates for RecordingLemmas {
    fn candidates(&self, word: &str, _language: &str) -> Vec<String> {
        self.calls.lock().unwrap().push(format!("lemma:{word}"));
        self.roots.iter().map(|r| r.to_string()).collect()
    }
}

struct RecordingDefiner {
    calls: Calls,
    answer: Option<&'static str>,
}

#[async_trait]
impl Definer for RecordingDefiner {
    async fn define(
        &self,
        word: &str,
        _context: &str,
        _language: &str,
    ) -> Result<Definition, DefineError> {
        self.calls.lock().unwrap().push(format!("define:{word}"));
        match self.answer {
            Some(translation) => Ok(Definition {
                translation: translation.to_string(),
                metadata: EntryMetadata::default().with_note("from context"),
                provider: "mock".to_string(),
            }),
            None => Err(DefineError::RateLimitExceeded),
        }
    }

    fn metadata(&self) -> DefinerMetadata {
        DefinerMetadata {
            name: "mock".to_string(),
            requires_api_key: false,
        }
    }
}

struct Fixture {
    hub: DictionaryHub,
    vocabulary: Arc<RwLock<Vocabulary>>,
    calls: Calls,
}

impl Fixture {
    fn new() -> Self {
        let config = HubConfig {
            bloom_bits: 4096,
            batch_size: 16,
            ..HubConfig::default()
        };
        let hub = DictionaryHub::new(
            Store::open_in_memory().unwrap(),
            BloomFilter::new(config.bloom_bits).shared(),
            config,
        );
        Self {
            hub,
            vocabulary: Arc::new(RwLock::new(Vocabulary::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn dictionary(&self, name: &str, entries: &[(&str, &str)]) {
        let source = self.hub.create_source(name, "en", SourceKind::Imported).await.unwrap();
        let entries = entries.iter().map(|(w, t)| NewEntry::new(w, *t)).collect();
        self.hub.import_batch(&source.id, entries).await.unwrap();
    }

    fn resolver(
        &self,
        roots: Vec<&'static str>,
        answer: Option<Option<&'static str>>,
        persist: bool,
    ) -> WaterfallResolver {
        let lemmas = Arc::new(RecordingLemmas {
            calls: Arc::clone(&self.calls),
            roots,
        });
        let definer = answer.map(|answer| {
            Arc::new(RecordingDefiner {
                calls: Arc::clone(&self.calls),
                answer,
            }) as Arc<dyn Definer>
        });
        WaterfallResolver::new(
            self.hub.clone(),
            Arc::clone(&self.vocabulary),
            lemmas,
            definer,
            persist,
        )
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn unknown_word_falls_through_to_definer_and_is_saved() {
    let fx = Fixture::new();
    let resolver = fx.resolver(vec!["run"], Some(Some("跑")), true);

    let resolution = resolver.resolve("Running", "he was running late", "en").await.unwrap();

    assert_eq!(fx.calls(), vec!["lemma:running", "define:Running"]);
    match &resolution {
        Resolution::Ai { word, definition, saved } => {
            assert_eq!(word, "Running");
            assert_eq!(definition.translation, "跑");
            assert!(*saved);
        }
        other => panic!("expected AI resolution, got {other:?}"),
    }
    assert_eq!(resolution.translation(), Some(("跑", "mock")));

    let sources = fx.hub.sources("en").await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].kind, SourceKind::User);
    assert_eq!(sources[0].count, 1);

    let hits = fx.hub.lookup_cascade("en", "running").await.unwrap();
    assert_eq!(hits[0].entry.translation, "跑");
    assert_eq!(hits[0].entry.metadata.notes, vec!["from context".to_string()]);
}

#[tokio::test]
async fn lemma_hit_skips_definer() {
    let fx = Fixture::new();
    fx.dictionary("Basic", &[("run", "跑")]).await;
    let resolver = fx.resolver(vec!["runn", "run"], Some(Some("unused")), true);

    let resolution = resolver.resolve("running", "", "en").await.unwrap();

    match resolution {
        Resolution::Lemma { word, root, winner, alternates } => {
            assert_eq!(word, "running");
            assert_eq!(root, "run");
            assert_eq!(winner.source.name, "Basic");
            assert_eq!(alternates.len(), 1);
        }
        other => panic!("expected lemma resolution, got {other:?}"),
    }
    assert_eq!(fx.calls(), vec!["lemma:running"]);
}

#[tokio::test]
async fn known_words_stop_at_vocabulary() {
    let fx = Fixture::new();
    fx.dictionary("Basic", &[("cat", "猫")]).await;
    fx.vocabulary.write().await.add("en", "Cat", "猫", "Basic");
    let resolver = fx.resolver(vec!["ca"], Some(Some("unused")), true);

    let resolution = resolver.resolve("cat!", "", "EN").await.unwrap();

    assert_eq!(resolution, Resolution::AlreadyKnown { word: "cat".to_string() });
    assert!(fx.calls().is_empty());
}

#[tokio::test]
async fn dictionary_hit_lists_every_source_in_priority_order() {
    let fx = Fixture::new();
    fx.dictionary("First", &[("cat", "猫")]).await;
    fx.dictionary("Second", &[("cat", "貓"), ("dog", "狗")]).await;
    let resolver = fx.resolver(vec![], None, true);

    let resolution = resolver.resolve("«Cat!»", "", "en").await.unwrap();

    match resolution {
        Resolution::Dictionary { word, winner, alternates } => {
            assert_eq!(word, "Cat");
            assert_eq!(winner.source.name, "First");
            assert_eq!(winner.entry.translation, "猫");
            let names: Vec<_> = alternates.iter().map(|a| a.source_name.as_str()).collect();
            assert_eq!(names, vec!["First", "Second"]);
            assert_eq!(alternates[1].translation, "貓");
        }
        other => panic!("expected dictionary resolution, got {other:?}"),
    }
    assert!(fx.calls().is_empty());
}

#[tokio::test]
async fn definer_failure_degrades_to_placeholder() {
    let fx = Fixture::new();
    let resolver = fx.resolver(vec![], Some(None), true);

    let resolution = resolver.resolve("zyzzyva", "", "en").await.unwrap();

    match &resolution {
        Resolution::Unavailable { word, reason, placeholder } => {
            assert_eq!(word, "zyzzyva");
            assert_eq!(reason, "Rate limit exceeded");
            assert_eq!(placeholder, UNAVAILABLE_PLACEHOLDER);
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert_eq!(resolution.translation(), None);
    assert!(fx.hub.sources("en").await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_definer_is_unavailable() {
    let fx = Fixture::new();
    let resolver = fx.resolver(vec!["zyzzyv"], None, true);

    let resolution = resolver.resolve("zyzzyva", "", "en").await.unwrap();

    assert!(matches!(
        resolution,
        Resolution::Unavailable { ref reason, .. } if reason == "no definer configured"
    ));
    assert_eq!(fx.calls(), vec!["lemma:zyzzyva"]);
}

#[tokio::test]
async fn results_are_not_saved_when_persistence_is_off() {
    let fx = Fixture::new();
    let resolver = fx.resolver(vec![], Some(Some("鸟")), false);

    let resolution = resolver.resolve("bird", "", "en").await.unwrap();

    assert!(matches!(resolution, Resolution::Ai { saved: false, .. }));
    assert!(fx.hub.sources("en").await.unwrap().is_empty());
}

#[tokio::test]
async fn punctuation_only_input_is_empty() {
    let fx = Fixture::new();
    let resolver = fx.resolver(vec!["x"], Some(Some("unused")), true);

    assert_eq!(resolver.resolve("  ...  ", "", "en").await.unwrap(), Resolution::Empty);
    assert_eq!(resolver.resolve("«»", "", "en").await.unwrap(), Resolution::Empty);
    assert_eq!(Resolution::Empty.word(), None);
    assert!(fx.calls().is_empty());
}
