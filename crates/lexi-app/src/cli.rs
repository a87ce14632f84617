use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lexi_core::MoveDirection;

#[derive(Parser)]
#[command(name = "lexi")]
#[command(about = "Multi-source vocabulary dictionary hub")]
pub struct Cli {
    /// JSON config file; `LEXI_*` environment variables are used otherwise
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Language to work in (defaults to the configured one)
    #[arg(long, short, global = true)]
    pub language: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a TXT/CSV/TSV word list as a new dictionary
    Import {
        path: PathBuf,
        /// Dictionary name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Download a word list over HTTP as a new dictionary
    Download {
        url: String,
        #[arg(long)]
        name: String,
    },
    /// Show every dictionary's definition of a word, best first
    Lookup { word: String },
    /// Run words through vocabulary, dictionaries, lemmas and the definer
    Resolve {
        #[arg(required = true)]
        words: Vec<String>,
        /// Sentence the words were taken from
        #[arg(long, default_value = "")]
        context: String,
    },
    /// List dictionaries in cascade order
    Sources {
        /// Every language, not just the selected one
        #[arg(long)]
        all: bool,
    },
    /// Move a dictionary up or down the cascade
    Move { id: String, direction: Direction },
    Enable { id: String },
    Disable { id: String },
    /// Delete an imported dictionary and its entries
    Delete { id: String },
    /// Remove every entry of a dictionary but keep it
    Clear { id: String },
    /// Fast Bloom-filter check, optionally confirmed against the store
    Known {
        #[arg(required = true)]
        words: Vec<String>,
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}
