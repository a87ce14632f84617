pub mod lemmatizer;

pub use lemmatizer::{EnglishLemmatizer, Inflection};
