use bigpacks_core::{
    encoded_len_with, pack_into_with, unpack_with, CodecConfig, DecodingError, Scanner, Value,
};
use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::error::{Result, StreamError};

/// Default maximum size of a single value on a stream: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for value streams.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Limits passed to the packer and unpacker.
    pub codec: CodecConfig,
    /// Maximum encoded size of one value in bytes. Default: 16 MiB.
    pub max_message_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            codec: CodecConfig::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Outcome of one decode attempt over a receive buffer.
#[derive(Debug)]
pub(crate) enum Decoded {
    Value(Value),
    /// Incomplete value; at least this many more bytes are required.
    Need(usize),
}

/// Append the encoding of `value` to `dst`.
pub fn encode_value(value: &Value, dst: &mut BytesMut, config: &StreamConfig) -> Result<()> {
    let size = encoded_len_with(value, &config.codec)?;
    if size > config.max_message_size {
        return Err(StreamError::MessageTooLarge {
            size,
            max: config.max_message_size,
        });
    }
    dst.reserve(size);
    pack_into_with(value, dst, &config.codec)?;
    Ok(())
}

/// Decode one value from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete value yet.
/// On success, consumes the value's bytes from the buffer and leaves any
/// following bytes in place.
///
/// Each call scans the buffer from the start. To feed a buffer that keeps
/// growing, use [`ValueReader`](crate::ValueReader) or `ValueCodec`, which
/// resume where the previous attempt stopped.
pub fn decode_value(src: &mut BytesMut, config: &StreamConfig) -> Result<Option<Value>> {
    match try_decode(src, &mut Scanner::new(), config)? {
        Decoded::Value(value) => Ok(Some(value)),
        Decoded::Need(_) => Ok(None),
    }
}

/// Scan newly buffered bytes and decode the value once all of it has arrived.
///
/// `scanner` must only have seen this buffer since its last value; it is
/// reset whenever a value is returned or rejected.
pub(crate) fn try_decode(
    src: &mut BytesMut,
    scanner: &mut Scanner,
    config: &StreamConfig,
) -> Result<Decoded> {
    match scanner.scan(&src[..], &config.codec) {
        Ok(len) => {
            scanner.reset();
            if len > config.max_message_size {
                return Err(StreamError::MessageTooLarge {
                    size: len,
                    max: config.max_message_size,
                });
            }
            let value = match unpack_with(&src[..len], &config.codec) {
                Ok((value, _)) => value,
                Err(err) => return Err(desynchronized(err, src.len())),
            };
            src.advance(len);
            debug!(consumed = len, kind = value.type_name(), "decoded value");
            Ok(Decoded::Value(value))
        }
        Err(DecodingError::Truncated { needed, .. }) => {
            let size = src.len() + needed;
            if size > config.max_message_size {
                return Err(StreamError::MessageTooLarge {
                    size,
                    max: config.max_message_size,
                });
            }
            trace!(
                buffered = src.len(),
                scanned = scanner.scanned(),
                needed,
                "incomplete value"
            );
            Ok(Decoded::Need(needed))
        }
        Err(err) => {
            scanner.reset();
            Err(desynchronized(err, src.len()))
        }
    }
}

fn desynchronized(err: DecodingError, buffered: usize) -> StreamError {
    warn!(error = %err, buffered, "malformed value, stream desynchronized");
    StreamError::Decode(err)
}

/// `tokio_util` codec for packed values.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    config: StreamConfig,
    scanner: Scanner,
}

#[cfg(feature = "async")]
impl ValueCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            config,
            scanner: Scanner::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for ValueCodec {
    type Item = Value;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        match try_decode(src, &mut self.scanner, &self.config)? {
            Decoded::Value(value) => Ok(Some(value)),
            Decoded::Need(needed) => {
                src.reserve(needed);
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        match self.decode(src)? {
            Some(value) => Ok(Some(value)),
            None if src.is_empty() => Ok(None),
            None => Err(StreamError::ConnectionClosed),
        }
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Encoder<&Value> for ValueCodec {
    type Error = StreamError;

    fn encode(&mut self, item: &Value, dst: &mut BytesMut) -> Result<()> {
        encode_value(item, dst, &self.config)
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Encoder<Value> for ValueCodec {
    type Error = StreamError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<()> {
        encode_value(&item, dst, &self.config)
    }
}
