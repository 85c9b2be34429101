use bigpacks_core::{DecodingError, EncodingError};

/// Errors that can occur while streaming packed values.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The value could not be packed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodingError),

    /// The buffered bytes can never decode; the stream is desynchronized.
    #[error("decode error: {0}")]
    Decode(#[from] DecodingError),

    /// A single value would exceed the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing values.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete value was received.
    #[error("connection closed (incomplete value)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, StreamError>;
