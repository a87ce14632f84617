pub mod bloom;
pub mod error;
pub mod language;
pub mod preprocess;
pub mod types;

pub use bloom::{BloomFilter, SharedBloom};
pub use error::BloomError;
pub use language::{LemmaCandidates, LemmaRouter};
pub use preprocess::{clean_word, contains_cjk, normalize_word};
pub use types::{
    CascadeHit, DictionaryEntry, DictionarySource, EntryMetadata, MoveDirection, NewEntry,
    SourceKind, StudyKind, StudyLog, UserProfile, now_millis,
};
