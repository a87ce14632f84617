#[derive(Debug, thiserror::Error)]
pub enum BloomError {
    #[error("Bloom filter size must be at least one bit")]
    EmptySize,

    #[error("Bloom buffer holds {actual} bytes, a {size}-bit filter needs {expected}")]
    BufferLength {
        size: usize,
        expected: usize,
        actual: usize,
    },
}
