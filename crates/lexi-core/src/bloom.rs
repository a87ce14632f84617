//! Fixed-size Bloom filter shared by the parser worker and the main context.
//!
//! Bit positions come from one FNV-1a hash of the word's UTF-8 bytes, expanded
//! to [`HASH_ROUNDS`] indices by double hashing. Both sides of an import must
//! agree on the filter size, otherwise [`BloomFilter::merge`] does nothing.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::BloomError;

/// Default size of the process-wide filter
pub const DEFAULT_BLOOM_BITS: usize = 2_000_000;

/// Bits set per word
pub const HASH_ROUNDS: u64 = 3;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;
const ROUND_STEP: u64 = 0x9e37_79b1;

/// Process-wide filter handle, owned by the application state
pub type SharedBloom = Arc<RwLock<BloomFilter>>;

#[derive(Clone, PartialEq, Eq)]
pub struct BloomFilter {
    size: usize,
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Empty filter of `size` bits. A zero size is bumped to one bit.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            bits: vec![0; byte_len(size)],
        }
    }

    /// Rebuild a filter from its wire form.
    pub fn from_parts(size: usize, bits: Vec<u8>) -> Result<Self, BloomError> {
        if size == 0 {
            return Err(BloomError::EmptySize);
        }
        let expected = byte_len(size);
        if bits.len() != expected {
            return Err(BloomError::BufferLength {
                size,
                expected,
                actual: bits.len(),
            });
        }
        Ok(Self { size, bits })
    }

    pub fn into_parts(self) -> (usize, Vec<u8>) {
        (self.size, self.bits)
    }

    pub fn shared(self) -> SharedBloom {
        Arc::new(RwLock::new(self))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Record `word`. The caller passes the canonical (normalized) form.
    pub fn add(&mut self, word: &str) {
        for index in positions(word, self.size) {
            self.bits[index / 8] |= 1 << (index % 8);
        }
    }

    /// `false` means definitely absent, `true` means possibly present.
    pub fn test(&self, word: &str) -> bool {
        positions(word, self.size).all(|index| self.bits[index / 8] & (1 << (index % 8)) != 0)
    }

    /// OR `other` into `self`. Filters of different sizes are left alone and
    /// `false` is returned.
    pub fn merge(&mut self, other: &BloomFilter) -> bool {
        if self.size != other.size {
            tracing::debug!(
                "Skipping bloom merge: size {} != {}",
                self.size,
                other.size
            );
            return false;
        }
        for (byte, incoming) in self.bits.iter_mut().zip(&other.bits) {
            *byte |= incoming;
        }
        true
    }

    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// False positive probability implied by the current fill ratio
    pub fn estimated_fpp(&self) -> f64 {
        let fill = self.bits_set() as f64 / self.size as f64;
        fill.powi(HASH_ROUNDS as i32)
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOOM_BITS)
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("size", &self.size)
            .field("bits_set", &self.bits_set())
            .finish()
    }
}

/// 32-bit FNV-1a over the UTF-8 bytes of `word`
pub fn fnv1a(word: &str) -> u32 {
    word.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    })
}

fn positions(word: &str, size: usize) -> impl Iterator<Item = usize> {
    let base = fnv1a(word) as u64;
    let size = size as u64;
    (0..HASH_ROUNDS).map(move |i| (base.wrapping_add(i.wrapping_mul(ROUND_STEP)) % size) as usize)
}

fn byte_len(size: usize) -> usize {
    size.div_ceil(8)
}
