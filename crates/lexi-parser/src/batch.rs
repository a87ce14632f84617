use lexi_core::{BloomFilter, NewEntry};

use crate::error::ParseError;
use crate::line::parse_line;
use crate::lines::LineBuffer;

const PREALLOCATE_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProgress {
    /// Entries parsed so far
    pub entries: u64,
    /// Raw bytes consumed so far
    pub bytes: u64,
}

impl ParseProgress {
    /// Percentage of `total_bytes` consumed, when the total is known
    pub fn percent_of(&self, total_bytes: u64) -> Option<f32> {
        (total_bytes > 0).then(|| (self.bytes as f64 / total_bytes as f64 * 100.0).min(100.0) as f32)
    }
}

/// Outcome of a finished parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSummary {
    pub entries: u64,
    pub bytes: u64,
    /// Bloom filter size in bits
    pub bloom_size: usize,
    /// Raw bit buffer of the parse-scoped Bloom filter
    pub bloom_bits: Vec<u8>,
}

impl ParseSummary {
    pub fn bloom(&self) -> Result<BloomFilter, ParseError> {
        Ok(BloomFilter::from_parts(self.bloom_size, self.bloom_bits.clone())?)
    }
}

/// Synchronous core of the streaming parser
#[derive(Debug)]
pub struct BatchParser {
    lines: LineBuffer,
    batch: Vec<NewEntry>,
    batch_size: usize,
    bloom: BloomFilter,
    entries: u64,
    bytes: u64,
}

impl BatchParser {
    pub fn new(batch_size: usize, bloom_bits: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            lines: LineBuffer::new(),
            batch: Vec::with_capacity(batch_size.min(PREALLOCATE_LIMIT)),
            batch_size,
            bloom: BloomFilter::new(bloom_bits),
            entries: 0,
            bytes: 0,
        }
    }

    /// Feed one chunk; returns the batches it filled
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<NewEntry>> {
        self.bytes += chunk.len() as u64;
        let mut ready = Vec::new();
        for line in self.lines.push(chunk) {
            self.accept(&line, &mut ready);
        }
        ready
    }

    /// Flush the trailing line and the partial batch
    pub fn finish(mut self) -> (Option<Vec<NewEntry>>, ParseSummary) {
        let mut ready = Vec::new();
        if let Some(line) = self.lines.finish() {
            self.accept(&line, &mut ready);
        }
        // a trailing line can complete at most one batch
        let mut tail: Vec<NewEntry> = ready.into_iter().flatten().collect();
        tail.append(&mut self.batch);

        let (bloom_size, bloom_bits) = self.bloom.into_parts();
        let summary = ParseSummary {
            entries: self.entries,
            bytes: self.bytes,
            bloom_size,
            bloom_bits,
        };
        ((!tail.is_empty()).then_some(tail), summary)
    }

    pub fn progress(&self) -> ParseProgress {
        ParseProgress {
            entries: self.entries,
            bytes: self.bytes,
        }
    }

    fn accept(&mut self, line: &str, ready: &mut Vec<Vec<NewEntry>>) {
        let Some(entry) = parse_line(line) else {
            return;
        };
        self.bloom.add(&entry.word);
        self.entries += 1;
        self.batch.push(entry);
        if self.batch.len() >= self.batch_size {
            let capacity = self.batch_size.min(PREALLOCATE_LIMIT);
            let full = std::mem::replace(&mut self.batch, Vec::with_capacity(capacity));
            ready.push(full);
        }
    }
}

/// Parse a complete in-memory text in one go
pub fn parse_all(text: &str, bloom_bits: usize) -> (Vec<NewEntry>, ParseSummary) {
    let mut parser = BatchParser::new(usize::MAX, bloom_bits);
    let mut entries: Vec<NewEntry> = parser.push(text.as_bytes()).into_iter().flatten().collect();
    let (tail, summary) = parser.finish();
    entries.extend(tail.into_iter().flatten());
    (entries, summary)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SAMPLE: &str = "cat,猫\ndog\t狗\n\"Smith, John\",人名\nbroken line\n학교,school,學校\n\r\nbird，鸟\nlast,one";

    fn parse_chunked(text: &[u8], cuts: &[usize], batch_size: usize) -> (Vec<NewEntry>, ParseSummary) {
        let mut parser = BatchParser::new(batch_size, 8192);
        let mut entries = Vec::new();
        let mut start = 0;
        for &cut in cuts {
            let cut = cut.clamp(start, text.len());
            for batch in parser.push(&text[start..cut]) {
                assert_eq!(batch.len(), batch_size);
                entries.extend(batch);
            }
            start = cut;
        }
        entries.extend(parser.push(&text[start..]).into_iter().flatten());
        let (tail, summary) = parser.finish();
        entries.extend(tail.into_iter().flatten());
        (entries, summary)
    }

    #[test]
    fn emits_full_batches_then_tail() {
        let mut parser = BatchParser::new(2, 1024);
        let batches = parser.push(b"a,1\nb,2\nc,3\nd,4\ne,5");
        assert_eq!(batches.len(), 2);
        assert_eq!(parser.progress().entries, 4);

        let (tail, summary) = parser.finish();
        let tail = tail.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].word, "e");
        assert_eq!(summary.entries, 5);
        assert_eq!(summary.bytes, 19);
    }

    #[test]
    fn summary_bloom_knows_parsed_words() {
        let (entries, summary) = parse_all(SAMPLE, 4096);
        assert_eq!(entries.len(), 6);
        assert_eq!(summary.entries, 6);

        let bloom = summary.bloom().unwrap();
        for entry in &entries {
            assert!(bloom.test(&entry.word));
        }
        assert!(bloom.test("smith, john"));
    }

    #[test]
    fn percent_needs_known_total() {
        let progress = ParseProgress { entries: 3, bytes: 50 };
        assert_eq!(progress.percent_of(200), Some(25.0));
        assert_eq!(progress.percent_of(0), None);
    }

    proptest! {
        #[test]
        fn prop_chunk_boundaries_do_not_matter(
            mut cuts in proptest::collection::vec(0usize..SAMPLE.len() + 8, 0..12),
            batch_size in 1usize..4,
        ) {
            cuts.sort_unstable();
            let (whole, whole_summary) = parse_all(SAMPLE, 8192);
            let (chunked, chunked_summary) = parse_chunked(SAMPLE.as_bytes(), &cuts, batch_size);

            prop_assert_eq!(&whole, &chunked);
            prop_assert_eq!(whole_summary.entries, chunked_summary.entries);
            prop_assert_eq!(whole_summary.bloom_bits, chunked_summary.bloom_bits);
        }
    }
}
