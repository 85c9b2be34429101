use std::io::{ErrorKind, Read};

use bigpacks_core::{Scanner, Value};
use bytes::BytesMut;
use tracing::trace;

use crate::codec::{try_decode, Decoded, StreamConfig};
use crate::error::{Result, StreamError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete values from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete values.
/// Bytes following a decoded value stay buffered for the next call.
pub struct ValueReader<T> {
    inner: T,
    buf: BytesMut,
    config: StreamConfig,
    // Walks each chunk once as it arrives; the value is decoded when complete.
    scanner: Scanner,
    // Set by the iterator after an error the stream cannot recover from.
    failed: bool,
}

impl<T: Read> ValueReader<T> {
    /// Create a new value reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, StreamConfig::default())
    }

    /// Create a new value reader with explicit configuration.
    pub fn with_config(inner: T, config: StreamConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            scanner: Scanner::new(),
            failed: false,
        }
    }

    /// Read the next complete value (blocking).
    ///
    /// Returns `Err(StreamError::ConnectionClosed)` when EOF is reached,
    /// whether or not part of a value was buffered.
    pub fn read_value(&mut self) -> Result<Value> {
        loop {
            let decoded = try_decode(&mut self.buf, &mut self.scanner, &self.config)?;
            if let Decoded::Value(value) = decoded {
                return Ok(value);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            };

            if read == 0 {
                return Err(StreamError::ConnectionClosed);
            }

            trace!(read, buffered = self.buf.len() + read, "read chunk");
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet returned as part of a value.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum message size for subsequent decoding.
    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.config.max_message_size = max_message_size;
    }

    /// Current value reader configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl<T: Read> Iterator for ValueReader<T> {
    type Item = Result<Value>;

    /// Yields values until the stream closes cleanly between values.
    ///
    /// After a malformed or oversized value, or a close in the middle of a
    /// value, the error is yielded once and the iterator ends. I/O errors
    /// such as `WouldBlock` do not end it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_value() {
            Err(StreamError::ConnectionClosed) if self.buf.is_empty() => None,
            Err(err) => {
                self.failed = !matches!(err, StreamError::Io(_));
                Some(Err(err))
            }
            ok => Some(ok),
        }
    }
}
