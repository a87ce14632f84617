use lexi_core::BloomError;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unsupported file type '.{extension}': {reason}")]
    UnsupportedFileType {
        extension: String,
        reason: &'static str,
    },

    #[error("Input looks like binary data, not a text word list")]
    BinaryInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parser worker stopped before the import finished")]
    WorkerGone,

    #[error("Invalid bloom buffer: {0}")]
    Bloom(#[from] BloomError),
}
