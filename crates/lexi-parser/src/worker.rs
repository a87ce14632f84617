use std::sync::atomic::{AtomicU64, Ordering};

use kanal::{AsyncReceiver, AsyncSender, Receiver, Sender};
use lexi_core::NewEntry;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::batch::{BatchParser, ParseProgress, ParseSummary};
use crate::error::ParseError;
use crate::file::looks_binary;

/// Input side of the worker protocol
#[derive(Debug)]
pub enum ParserCommand {
    Chunk(Vec<u8>),
    /// No more chunks; flush and report
    End,
}

/// Output side of the worker protocol
#[derive(Debug)]
pub enum ParserEvent {
    Progress(ParseProgress),
    Batch(Vec<NewEntry>),
    Done(ParseSummary),
    Failed(ParseError),
}

#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    pub batch_size: usize,
    pub bloom_bits: usize,
    /// Bound of both channels; a full channel blocks the producing side
    pub channel_capacity: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            batch_size: 2000,
            bloom_bits: lexi_core::bloom::DEFAULT_BLOOM_BITS,
            channel_capacity: 8,
        }
    }
}

/// Sending half handed to whoever reads the input
#[derive(Clone)]
pub struct ParserHandle {
    commands: AsyncSender<ParserCommand>,
}

impl ParserHandle {
    pub async fn push(&self, chunk: Vec<u8>) -> Result<(), ParseError> {
        self.commands
            .send(ParserCommand::Chunk(chunk))
            .await
            .map_err(|_| ParseError::WorkerGone)
    }

    pub async fn end(self) -> Result<(), ParseError> {
        self.commands
            .send(ParserCommand::End)
            .await
            .map_err(|_| ParseError::WorkerGone)
    }

    /// Stream `reader` into the worker in `chunk_size` pieces, then end it.
    ///
    /// `read_bytes` is bumped after each chunk so a caller can report network
    /// or disk progress independently of parse progress. A read error drops
    /// the handle without `End`, which aborts the worker.
    pub async fn feed<R>(
        self,
        mut reader: R,
        chunk_size: usize,
        read_bytes: &AtomicU64,
    ) -> Result<u64, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut total = 0u64;
        let mut buf = vec![0u8; chunk_size.max(1)];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            self.push(buf[..n].to_vec()).await?;
            read_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }
        self.end().await?;
        Ok(total)
    }
}

/// Start a parser on the blocking pool.
///
/// Returns the input handle, the event stream and the worker's join handle.
/// The worker stops after `Done` or `Failed`, when the input closes without
/// `End`, or as soon as the event receiver is dropped.
pub fn spawn_parser(
    options: ParserOptions,
) -> (ParserHandle, AsyncReceiver<ParserEvent>, JoinHandle<()>) {
    let capacity = options.channel_capacity.max(1);
    let (command_tx, command_rx) = kanal::bounded::<ParserCommand>(capacity);
    let (event_tx, event_rx) = kanal::bounded::<ParserEvent>(capacity);

    let worker = tokio::task::spawn_blocking(move || run_worker(options, command_rx, event_tx));

    (
        ParserHandle {
            commands: command_tx.to_async(),
        },
        event_rx.to_async(),
        worker,
    )
}

fn run_worker(options: ParserOptions, commands: Receiver<ParserCommand>, events: Sender<ParserEvent>) {
    let mut parser = BatchParser::new(options.batch_size, options.bloom_bits);
    let mut sniffed = false;

    loop {
        let Ok(command) = commands.recv() else {
            tracing::warn!("Parser input closed before end of stream, aborting");
            return;
        };

        match command {
            ParserCommand::Chunk(chunk) => {
                if !sniffed && !chunk.is_empty() {
                    sniffed = true;
                    if looks_binary(&chunk) {
                        tracing::warn!("Rejecting binary input");
                        let _ = events.send(ParserEvent::Failed(ParseError::BinaryInput));
                        return;
                    }
                }

                for batch in parser.push(&chunk) {
                    if events.send(ParserEvent::Batch(batch)).is_err() {
                        return;
                    }
                }
                if events.send(ParserEvent::Progress(parser.progress())).is_err() {
                    return;
                }
            }
            ParserCommand::End => {
                let (tail, summary) = parser.finish();
                if let Some(tail) = tail {
                    if events.send(ParserEvent::Batch(tail)).is_err() {
                        return;
                    }
                }
                tracing::debug!(
                    "Parser finished: {} entries from {} bytes",
                    summary.entries,
                    summary.bytes
                );
                let _ = events.send(ParserEvent::Done(summary));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(batch_size: usize) -> ParserOptions {
        ParserOptions {
            batch_size,
            bloom_bits: 1024,
            channel_capacity: 2,
        }
    }

    async fn drain(events: AsyncReceiver<ParserEvent>) -> Vec<ParserEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.recv().await {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn feeds_reader_through_worker() {
        let text = "cat,猫\ndog,狗\nbird,鸟\nfish,鱼\nowl,猫头鹰\n";
        let (handle, events, worker) = spawn_parser(options(2));
        let read = AtomicU64::new(0);

        let consumer = tokio::spawn(drain(events));
        let total = handle.feed(text.as_bytes(), 7, &read).await.unwrap();
        let events = consumer.await.unwrap();
        worker.await.unwrap();

        assert_eq!(total, text.len() as u64);
        assert_eq!(read.load(Ordering::Relaxed), total);

        let words: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                ParserEvent::Batch(batch) => Some(batch.iter().map(|x| x.word.clone())),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(words, vec!["cat", "dog", "bird", "fish", "owl"]);

        match events.last() {
            Some(ParserEvent::Done(summary)) => {
                assert_eq!(summary.entries, 5);
                assert!(summary.bloom().unwrap().test("owl"));
            }
            other => panic!("expected Done, got {other:?}"),
        }
        assert!(events.iter().any(|e| matches!(e, ParserEvent::Progress(_))));
    }

    #[tokio::test]
    async fn binary_first_chunk_fails() {
        let (handle, events, worker) = spawn_parser(options(10));
        handle.push(vec![0x50, 0x4b, 0x03, 0x04, 0x00]).await.unwrap();

        let event = events.recv().await.unwrap();
        assert!(matches!(event, ParserEvent::Failed(ParseError::BinaryInput)));
        worker.await.unwrap();
        assert!(matches!(handle.push(b"more".to_vec()).await, Err(ParseError::WorkerGone)));
    }

    #[tokio::test]
    async fn closing_input_without_end_aborts() {
        let (handle, events, worker) = spawn_parser(options(10));
        handle.push("cat,猫\n".as_bytes().to_vec()).await.unwrap();
        drop(handle);

        let events = drain(events).await;
        worker.await.unwrap();
        assert!(!events.iter().any(|e| matches!(e, ParserEvent::Done(_))));
    }

    #[tokio::test]
    async fn dropped_consumer_stops_worker() {
        let (handle, events, worker) = spawn_parser(options(1));
        drop(events);

        let lines = "a,1\n".repeat(64);
        let read = AtomicU64::new(0);
        let result = handle.feed(lines.as_bytes(), 4, &read).await;

        assert!(matches!(result, Err(ParseError::WorkerGone)));
        worker.await.unwrap();
    }
}
