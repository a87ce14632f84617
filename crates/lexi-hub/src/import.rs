use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lexi_core::{DictionarySource, SourceKind};
use lexi_parser::{ParseError, ParseSummary, ParserEvent, check_file_type, spawn_parser};
use tokio::io::AsyncRead;

use crate::error::{HubError, Result};
use crate::hub::DictionaryHub;

/// Snapshot reported while an import runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImportProgress {
    /// Bytes pulled from the reader (disk or network)
    pub bytes_read: u64,
    /// Bytes the parser has consumed
    pub bytes_parsed: u64,
    pub total_bytes: Option<u64>,
    pub entries_parsed: u64,
    /// Entries whose batch has been committed
    pub entries_committed: u64,
}

impl ImportProgress {
    /// Parser progress against the known total
    pub fn percent(&self) -> Option<f32> {
        let total = self.total_bytes.filter(|t| *t > 0)?;
        Some((self.bytes_parsed as f64 / total as f64 * 100.0).min(100.0) as f32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    /// Source as stored after the import, with its final count
    pub source: DictionarySource,
    pub entries_parsed: u64,
    /// Words that were new to the source
    pub inserted: u64,
    pub bytes: u64,
}

impl DictionaryHub {
    /// Import a text word list from disk into a fresh IMPORTED source
    pub async fn import_file<F>(
        &self,
        path: &Path,
        name: &str,
        language: &str,
        on_progress: F,
    ) -> Result<ImportReport>
    where
        F: FnMut(ImportProgress) + Send,
    {
        check_file_type(path)?;
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let source = self.create_source(name, language, SourceKind::Imported).await?;
        tracing::info!("Importing {} ({} bytes) into '{}'", path.display(), total, source.name);
        self.import_reader(&source.id, file, Some(total), on_progress).await
    }

    /// Stream `reader` through the parser worker into an existing source.
    ///
    /// Each batch is committed, and its words recorded in the global filter,
    /// before the next parser event is received, so a slow store throttles the
    /// reader through the bounded channels. A failure keeps the batches
    /// committed so far.
    pub async fn import_reader<R, F>(
        &self,
        source_id: &str,
        reader: R,
        total_bytes: Option<u64>,
        mut on_progress: F,
    ) -> Result<ImportReport>
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: FnMut(ImportProgress) + Send,
    {
        // fail before any work is spawned
        self.source(source_id).await?;

        let (handle, events, worker) = spawn_parser(self.parser_options());
        let read_bytes = Arc::new(AtomicU64::new(0));
        let feeder = {
            let read_bytes = Arc::clone(&read_bytes);
            let chunk_size = self.config.chunk_size;
            tokio::spawn(async move { handle.feed(reader, chunk_size, &read_bytes).await })
        };

        let mut progress = ImportProgress {
            total_bytes,
            ..ImportProgress::default()
        };
        let mut inserted = 0u64;
        let mut summary: Option<ParseSummary> = None;

        while let Ok(event) = events.recv().await {
            progress.bytes_read = read_bytes.load(Ordering::Relaxed);
            match event {
                ParserEvent::Batch(batch) => {
                    let size = batch.len() as u64;
                    match self.import_batch(source_id, batch).await {
                        Ok(new) => inserted += new,
                        Err(e) => {
                            tracing::error!("Import into {} stopped: {}", source_id, e);
                            feeder.abort();
                            return Err(e);
                        }
                    }
                    progress.entries_committed += size;
                    on_progress(progress);
                }
                ParserEvent::Progress(parsed) => {
                    progress.bytes_parsed = parsed.bytes;
                    progress.entries_parsed = parsed.entries;
                    on_progress(progress);
                }
                ParserEvent::Done(done) => {
                    summary = Some(done);
                    break;
                }
                ParserEvent::Failed(err) => {
                    tracing::warn!("Parser rejected input for {}: {}", source_id, err);
                    feeder.abort();
                    return Err(err.into());
                }
            }
        }
        drop(events);

        let fed = feeder.await?;
        worker.await?;
        let Some(summary) = summary else {
            // the worker only stops silently when the feeder gave up
            return Err(match fed {
                Err(err) => err.into(),
                Ok(_) => HubError::Parse(ParseError::WorkerGone),
            });
        };
        let bytes = fed?;

        // committed batches are already in the global filter
        let parsed = summary.bloom()?;
        if !self.bloom.write().await.merge(&parsed) {
            tracing::debug!("Import filter size differs from the global filter, not merged");
        }

        progress.bytes_read = bytes;
        progress.bytes_parsed = summary.bytes;
        progress.entries_parsed = summary.entries;
        on_progress(progress);

        let source = self.source(source_id).await?;
        tracing::info!(
            "Imported {} entries ({} new) into '{}', {} total",
            summary.entries,
            inserted,
            source.name,
            source.count
        );
        Ok(ImportReport {
            source,
            entries_parsed: summary.entries,
            inserted,
            bytes,
        })
    }
}
