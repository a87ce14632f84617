use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::preprocess::{contains_cjk, normalize_word};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    /// Per-language personal dictionary, never deleted
    User,
    Imported,
    System,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::User => "USER",
            SourceKind::Imported => "IMPORTED",
            SourceKind::System => "SYSTEM",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(SourceKind::User),
            "IMPORTED" => Ok(SourceKind::Imported),
            "SYSTEM" => Ok(SourceKind::System),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Metadata record of one dictionary source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionarySource {
    pub id: String,
    pub name: String,
    pub language: String,
    /// Lower wins
    pub priority: i64,
    pub enabled: bool,
    /// Cached number of entries
    pub count: u64,
    /// Unix milliseconds
    pub imported_at: i64,
    pub kind: SourceKind,
}

impl DictionarySource {
    /// Deterministic id of the USER source for `language`
    pub fn user_id(language: &str) -> String {
        format!("user:{}", language.to_lowercase())
    }
}

/// Reorder step. `Up` moves toward higher precedence (lower priority number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Optional descriptive fields attached to an entry.
///
/// Every field is optional and only set through the validating constructors,
/// so the stored JSON always follows this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryMetadata {
    /// Grammatical gender ("m", "f", "n", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Register or usage note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuance: Option<String>,
    /// Root-script spelling such as Hanja or Kanji. Always contains CJK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honorific: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl EntryMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Accepts `value` as root script only if it carries CJK characters
    pub fn with_root_script(mut self, value: &str) -> Self {
        self.root_script = clean_field(value).filter(|v| contains_cjk(v));
        self
    }

    pub fn with_gender(mut self, value: &str) -> Self {
        self.gender = clean_field(value).map(|v| v.to_lowercase());
        self
    }

    pub fn with_nuance(mut self, value: &str) -> Self {
        self.nuance = clean_field(value);
        self
    }

    pub fn with_note(mut self, value: &str) -> Self {
        if let Some(note) = clean_field(value) {
            self.notes.push(note);
        }
        self
    }

    /// Build from loose key/value pairs (e.g. an AI response). Unknown keys
    /// become notes.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut metadata = Self::default();
        for (key, value) in pairs {
            metadata = match key.to_ascii_lowercase().as_str() {
                "gender" => metadata.with_gender(value),
                "nuance" | "usage" => metadata.with_nuance(value),
                "hanja" | "kanji" | "root_script" => metadata.with_root_script(value),
                "cognate" => Self {
                    cognate: clean_field(value),
                    ..metadata
                },
                "honorific" => Self {
                    honorific: clean_field(value),
                    ..metadata
                },
                "etymology" => Self {
                    etymology: clean_field(value),
                    ..metadata
                },
                _ => metadata.with_note(&format!("{key}: {value}")),
            };
        }
        metadata
    }
}

fn clean_field(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Entry as produced by the parser or an AI definition, before it is bound
/// to a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Canonical key; may be empty for unusable input, which is never stored
    pub word: String,
    pub original: Option<String>,
    pub translation: String,
    pub metadata: EntryMetadata,
    pub audio_path: Option<String>,
}

impl NewEntry {
    /// Normalizes `raw_word`; the raw form is kept as `original` when it differs
    pub fn new(raw_word: &str, translation: impl Into<String>) -> Self {
        let word = normalize_word(raw_word);
        let trimmed = raw_word.trim();
        let original = (trimmed != word).then(|| trimmed.to_string());
        Self {
            word,
            original,
            translation: translation.into(),
            metadata: EntryMetadata::default(),
            audio_path: None,
        }
    }

    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn has_word(&self) -> bool {
        !self.word.is_empty()
    }
}

/// Stored entry, unique per `(dict_id, word)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub dict_id: String,
    pub word: String,
    pub original: Option<String>,
    pub translation: String,
    pub metadata: EntryMetadata,
    pub audio_path: Option<String>,
}

impl DictionaryEntry {
    pub fn display_word(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.word)
    }
}

/// One element of a cascade lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeHit {
    pub entry: DictionaryEntry,
    pub source: DictionarySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyKind {
    Listening,
    Reading,
    Vocabulary,
    Review,
}

impl StudyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyKind::Listening => "listening",
            StudyKind::Reading => "reading",
            StudyKind::Vocabulary => "vocabulary",
            StudyKind::Review => "review",
        }
    }
}

impl FromStr for StudyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listening" => Ok(StudyKind::Listening),
            "reading" => Ok(StudyKind::Reading),
            "vocabulary" => Ok(StudyKind::Vocabulary),
            "review" => Ok(StudyKind::Review),
            other => Err(format!("unknown study kind: {other}")),
        }
    }
}

/// Append-only study telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyLog {
    pub id: String,
    pub user_id: Option<String>,
    pub kind: StudyKind,
    pub language: String,
    pub score: f64,
    /// Seconds
    pub duration: u64,
    /// Unix milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub native_language: String,
    pub target_language: String,
    pub created_at: i64,
}

/// Current time as Unix milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
