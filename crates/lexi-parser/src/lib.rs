//! Streaming word-list parser.
//!
//! Raw bytes go in chunk by chunk; complete lines are split into
//! `(word, translation, metadata)` entries, grouped into fixed-size batches and
//! recorded in a Bloom filter scoped to the parse. [`spawn_parser`] runs the
//! same machinery on a blocking worker behind bounded channels.

pub mod batch;
pub mod error;
pub mod file;
pub mod line;
pub mod lines;
pub mod worker;

pub use batch::{BatchParser, ParseProgress, ParseSummary, parse_all};
pub use error::ParseError;
pub use file::check_file_type;
pub use line::parse_line;
pub use lines::LineBuffer;
pub use worker::{ParserCommand, ParserEvent, ParserHandle, ParserOptions, spawn_parser};
