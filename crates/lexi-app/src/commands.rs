use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use lexi_core::{CascadeHit, DictionarySource, EntryMetadata};
use lexi_sync::SyncOrchestrator;
use serde::Serialize;

use crate::cli::Command;
use crate::state::AppState;
use crate::waterfall::Resolution;

#[derive(Serialize)]
struct HitView<'a> {
    source: &'a str,
    priority: i64,
    word: &'a str,
    translation: &'a str,
    #[serde(skip_serializing_if = "EntryMetadata::is_empty")]
    metadata: &'a EntryMetadata,
}

impl<'a> From<&'a CascadeHit> for HitView<'a> {
    fn from(hit: &'a CascadeHit) -> Self {
        Self {
            source: &hit.source.name,
            priority: hit.source.priority,
            word: hit.entry.display_word(),
            translation: &hit.entry.translation,
            metadata: &hit.entry.metadata,
        }
    }
}

#[derive(Serialize)]
struct ResolutionView<'a> {
    input: &'a str,
    stage: &'static str,
    word: Option<&'a str>,
    translation: Option<&'a str>,
    origin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<&'a str>,
}

fn stage(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::AlreadyKnown { .. } => "vocabulary",
        Resolution::Dictionary { .. } => "dictionary",
        Resolution::Lemma { .. } => "lemma",
        Resolution::Ai { .. } => "ai",
        Resolution::Unavailable { .. } => "unavailable",
        Resolution::Empty => "empty",
    }
}

/// Execute one CLI command
pub async fn run(
    state: Arc<AppState>,
    command: Command,
    language: &str,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Import { path, name } => import(&state, &path, name, language).await,
        Command::Download { url, name } => download(&state, &url, &name, language).await,
        Command::Lookup { word } => lookup(&state, &word, language, json).await,
        Command::Resolve { words, context } => resolve(&state, &words, &context, language, json).await,
        Command::Sources { all } => sources(&state, all, language, json).await,
        Command::Move { id, direction } => {
            let ordered = state.hub.reorder(&id, direction.into()).await?;
            print_sources(&ordered, json)
        }
        Command::Enable { id } => {
            let source = state.hub.set_enabled(&id, true).await?;
            println!("Enabled '{}'", source.name);
            Ok(())
        }
        Command::Disable { id } => {
            let source = state.hub.set_enabled(&id, false).await?;
            println!("Disabled '{}'", source.name);
            Ok(())
        }
        Command::Delete { id } => {
            state.hub.delete_source(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
        Command::Clear { id } => {
            let removed = state.hub.clear_entries(&id).await?;
            println!("Removed {} entries from {}", removed, id);
            Ok(())
        }
        Command::Known { words, confirm } => known(&state, &words, language, confirm).await,
    }
}

async fn import(
    state: &AppState,
    path: &Path,
    name: Option<String>,
    language: &str,
) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Imported".to_string())
    });

    let report = state
        .hub
        .import_file(path, &name, language, |progress| {
            if let Some(percent) = progress.percent() {
                tracing::debug!("{:5.1}% ({} entries committed)", percent, progress.entries_committed);
            }
        })
        .await
        .with_context(|| format!("importing {}", path.display()))?;

    println!(
        "Imported {} entries ({} new) into '{}' [{}]",
        report.entries_parsed, report.inserted, report.source.name, report.source.id
    );
    Ok(())
}

async fn download(state: &AppState, url: &str, name: &str, language: &str) -> anyhow::Result<()> {
    let sync_config = state.config.read().await.sync.clone();
    let sync = SyncOrchestrator::new(state.hub.clone(), &sync_config)?;

    let report = sync
        .download(url, name, language, |status, percent| {
            tracing::info!("{:5.1}% {}", percent, status);
        })
        .await?;

    println!(
        "Downloaded {} bytes, {} entries into '{}' [{}]",
        report.bytes, report.entries_parsed, report.source.name, report.source.id
    );
    Ok(())
}

async fn lookup(state: &AppState, word: &str, language: &str, json: bool) -> anyhow::Result<()> {
    let hits = state.hub.lookup_cascade(language, word).await?;

    if json {
        let views: Vec<HitView> = hits.iter().map(HitView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No dictionary knows '{}'", word);
    }
    for hit in &hits {
        println!(
            "[{}] {}: {} = {}",
            hit.source.priority,
            hit.source.name,
            hit.entry.display_word(),
            hit.entry.translation
        );
        if let Some(root) = &hit.entry.metadata.root_script {
            println!("      root: {}", root);
        }
    }
    Ok(())
}

async fn resolve(
    state: &AppState,
    words: &[String],
    context: &str,
    language: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut views = Vec::new();
    for input in words {
        let resolution = state.resolver.resolve(input, context, language).await?;

        if let (Some(word), Some((translation, origin))) =
            (resolution.word(), resolution.translation())
        {
            state
                .vocabulary
                .write()
                .await
                .add(language, word, translation, origin);
        }

        if json {
            views.push((input.clone(), resolution));
            continue;
        }
        match &resolution {
            Resolution::AlreadyKnown { word } => println!("{}: already in vocabulary", word),
            Resolution::Dictionary { word, winner, alternates } => {
                println!("{}: {} ({})", word, winner.entry.translation, winner.source.name);
                for alternate in alternates.iter().skip(1) {
                    println!("    [{}] {}: {}", alternate.priority, alternate.source_name, alternate.translation);
                }
            }
            Resolution::Lemma { word, root, winner, .. } => println!(
                "{} → {}: {} ({})",
                word, root, winner.entry.translation, winner.source.name
            ),
            Resolution::Ai { word, definition, saved } => println!(
                "{}: {} (AI{})",
                word,
                definition.translation,
                if *saved { ", saved" } else { "" }
            ),
            Resolution::Unavailable { word, reason, placeholder } => {
                println!("{}: {} [{}]", word, placeholder, reason)
            }
            Resolution::Empty => println!("'{}': nothing to look up", input),
        }
    }

    if json {
        let out: Vec<ResolutionView> = views
            .iter()
            .map(|(input, resolution)| {
                let translation = resolution.translation();
                ResolutionView {
                    input,
                    stage: stage(resolution),
                    word: resolution.word(),
                    translation: translation.map(|(t, _)| t),
                    origin: translation.map(|(_, o)| o),
                    root: match resolution {
                        Resolution::Lemma { root, .. } => Some(root.as_str()),
                        _ => None,
                    },
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

async fn sources(state: &AppState, all: bool, language: &str, json: bool) -> anyhow::Result<()> {
    let sources = if all {
        state.hub.all_sources().await?
    } else {
        state.hub.sources(language).await?
    };
    print_sources(&sources, json)?;

    if !json {
        let bloom = state.bloom.read().await;
        println!(
            "Bloom filter: {} of {} bits set, ~{:.4} false-positive rate",
            bloom.bits_set(),
            bloom.size(),
            bloom.estimated_fpp()
        );
    }
    Ok(())
}

fn print_sources(sources: &[DictionarySource], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sources)?);
        return Ok(());
    }
    for source in sources {
        println!(
            "{:>3} {} {:<24} {:>8} words  {:<8} {} [{}]",
            source.priority,
            if source.enabled { "+" } else { "-" },
            source.name,
            source.count,
            source.kind,
            source.language,
            source.id
        );
    }
    Ok(())
}

async fn known(state: &AppState, words: &[String], language: &str, confirm: bool) -> anyhow::Result<()> {
    for word in words {
        let probable = state.hub.is_probably_known(word).await;
        let verdict = match (probable, confirm) {
            (false, _) => "unknown",
            (true, false) => "probably known",
            (true, true) => {
                if state.hub.lookup_cascade(language, word).await?.is_empty() {
                    "unknown (filter false positive or other language)"
                } else {
                    "known"
                }
            }
        };
        println!("{}: {}", word, verdict);
    }
    Ok(())
}
